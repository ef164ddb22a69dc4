//! 기본 타입 정의.

mod stock_code;

pub use stock_code::StockCode;
