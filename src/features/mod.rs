/// 健康检查
pub mod health;

/// 带样式的二维码生成
pub mod qr;
