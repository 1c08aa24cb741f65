use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("neighbor send port {0} out of range [1024, 64000]")]
    SendPortOutOfRange(u16),
    #[error("neighbor link cost {0} out of range [1, 16]")]
    LinkCostOutOfRange(u8),
}
