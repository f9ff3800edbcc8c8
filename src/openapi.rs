use utoipa::openapi::server::{ServerBuilder, ServerVariableBuilder};
use utoipa::{Modify, OpenApi};

/// Swagger UI 的 Servers：业务接口挂在 `config.api.prefix` 下（默认为空），`/health` 始终在根路径。
struct ApiServers;

impl Modify for ApiServers {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let api = ServerBuilder::new()
            .url("{api_prefix}")
            .description(Some("业务接口（默认无前缀）"))
            .parameter(
                "api_prefix",
                ServerVariableBuilder::new()
                    .default_value("")
                    .description(Some(
                        "业务接口前缀：对应 config.api.prefix（可通过 APP_API__PREFIX 覆盖）",
                    )),
            )
            .build();

        let root = ServerBuilder::new()
            .url("/")
            .description(Some("根路径（/health）"))
            .build();

        openapi.servers = Some(vec![api, root]);
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::features::health::handler::health_check,
        crate::features::qr::handler::generate_qr,
    ),
    components(schemas(
        crate::error::ProblemDetails,
        crate::features::qr::types::QrRequest,
        crate::features::qr::types::VersionSpec,
        crate::features::health::handler::HealthResponse,
    )),
    modifiers(&ApiServers),
    tags(
        (
            name = "QrCode",
            description = "二维码生成：颜色、形状、风格预设、定位点分色与 logo 叠加。"
        ),
        (name = "Health", description = "健康检查：服务探活。"),
    ),
    info(
        title = "QR Style API",
        version = env!("CARGO_PKG_VERSION"),
        description = "带样式的二维码生成服务（Axum + utoipa）。错误统一为 RFC7807 ProblemDetails（application/problem+json）。"
    )
)]
pub struct ApiDoc;
