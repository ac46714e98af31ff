//! Webhook 签名验证
//!
//! 签名头格式: `t=<unix 时间戳>,v1=<hex(HMAC-SHA256(secret, "t.payload"))>`

use chrono::Utc;
use manikura_errors::{AppError, AppResult};
use serde::Deserialize;
use sha2::{Digest, Sha256};

/// 默认允许的时间戳偏差（秒）
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

const BLOCK_SIZE: usize = 64;

/// HMAC-SHA256 (RFC 2104)
fn hmac_sha256(key: &[u8], message: &[u8]) -> [u8; 32] {
    let mut key_block = [0u8; BLOCK_SIZE];
    if key.len() > BLOCK_SIZE {
        key_block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        key_block[..key.len()].copy_from_slice(key);
    }

    let mut ipad = [0x36u8; BLOCK_SIZE];
    let mut opad = [0x5cu8; BLOCK_SIZE];
    for i in 0..BLOCK_SIZE {
        ipad[i] ^= key_block[i];
        opad[i] ^= key_block[i];
    }

    let inner = Sha256::new()
        .chain_update(ipad)
        .chain_update(message)
        .finalize();
    let outer = Sha256::new()
        .chain_update(opad)
        .chain_update(inner)
        .finalize();

    outer.into()
}

/// 常数时间比较
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// 验证 webhook 签名
///
/// 时间戳超出容忍范围、签名头缺失或不匹配时返回 Validation 错误
pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<String> = Vec::new();

    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => {
                timestamp = value.parse().ok();
            }
            Some(("v1", value)) => {
                signatures.push(value.to_string());
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::validation("Missing timestamp in signature header"))?;

    if signatures.is_empty() {
        return Err(AppError::validation("Missing signature in signature header"));
    }

    let age = (Utc::now().timestamp() - timestamp).abs();
    if age > tolerance_secs {
        return Err(AppError::validation("Signature timestamp outside tolerance"));
    }

    let mut signed_payload = Vec::with_capacity(payload.len() + 16);
    signed_payload.extend_from_slice(timestamp.to_string().as_bytes());
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    let expected = hmac_sha256(secret.as_bytes(), &signed_payload);

    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|decoded| constant_time_eq(&decoded, &expected))
            .unwrap_or(false)
    });

    if !matched {
        return Err(AppError::validation("Invalid webhook signature"));
    }

    Ok(())
}

/// 生成签名头（供测试与本地联调使用）
pub fn sign_payload(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let mut signed_payload = Vec::with_capacity(payload.len() + 16);
    signed_payload.extend_from_slice(timestamp.to_string().as_bytes());
    signed_payload.push(b'.');
    signed_payload.extend_from_slice(payload);

    let mac = hmac_sha256(secret.as_bytes(), &signed_payload);
    format!("t={},v1={}", timestamp, hex::encode(mac))
}

/// Webhook 事件
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
struct WebhookEventData {
    object: serde_json::Value,
}

impl WebhookEvent {
    /// 事件携带的对象（session、payment intent 等）
    pub fn object(&self) -> &serde_json::Value {
        &self.data.object
    }
}

/// 解析事件体
pub fn parse_event(payload: &[u8]) -> AppResult<WebhookEvent> {
    serde_json::from_slice(payload)
        .map_err(|e| AppError::validation(format!("Invalid webhook payload: {}", e)))
}
