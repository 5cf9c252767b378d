pub mod binance;
pub mod columnar;
pub mod http_client_factory;
