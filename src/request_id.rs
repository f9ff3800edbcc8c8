use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// 请求追踪头
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// 客户端传入 request_id 的最大长度
const MAX_REQUEST_ID_LEN: usize = 128;

/// 请求扩展中的 request_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

tokio::task_local! {
    static TASK_REQUEST_ID: String;
}

/// 当前异步任务绑定的 request_id（供错误响应透传）
pub fn current_request_id() -> Option<String> {
    TASK_REQUEST_ID.try_with(String::clone).ok()
}

fn is_acceptable(v: &str) -> bool {
    (1..=MAX_REQUEST_ID_LEN).contains(&v.len())
        && v
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn generate() -> String {
    format!("qr_{}", Uuid::new_v4().simple())
}

/// 透传合法的 `X-Request-Id`，缺失或非法时生成新的。
fn resolve(req: &Request) -> String {
    req.headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| is_acceptable(v))
        .map_or_else(generate, str::to_string)
}

/// request_id 中间件：写入请求扩展与任务上下文，并回写到响应头。
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = resolve(&req);
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let mut res = TASK_REQUEST_ID
        .scope(request_id.clone(), next.run(req))
        .await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::{REQUEST_ID_HEADER, current_request_id, is_acceptable, resolve};
    use axum::{body::Body, extract::Request};

    #[test]
    fn accepts_safe_ids_only() {
        assert!(is_acceptable("req-123_abc.def"));
        assert!(!is_acceptable(""));
        assert!(!is_acceptable("bad id"));
        assert!(!is_acceptable("bad/xx"));
        assert!(!is_acceptable(&"a".repeat(129)));
    }

    #[test]
    fn invalid_header_gets_generated_id() {
        let req = Request::builder()
            .header(REQUEST_ID_HEADER, "has space")
            .body(Body::empty())
            .unwrap();
        let id = resolve(&req);
        assert!(id.starts_with("qr_"));
        assert_eq!(id.len(), 3 + 32);
    }

    #[test]
    fn no_request_id_outside_of_request_scope() {
        assert!(current_request_id().is_none());
    }
}
