use permission_scheme_service::interface::{
    AttachTeamRequest,
    CreateSchemeRequest,
    EditRoleRequest,
    ErrorResponse,
    GroupStatusResponse,
    GroupStatusesResponse,
    PatchSchemeRequest,
    PermissionRowResponse,
    PermissionTreeResponse,
    // DTOs
    RoleResponse,
    RolesListResponse,
    SaveSchemeRolesRequest,
    SchemeResponse,
    SchemeTeamsResponse,
    SchemesListResponse,
    ToggleGroupRequest,
    ToggleGroupResponse,
    TreeGroupResponse,
    TreeNodeResponse,
    attach_team_handler,
    create_scheme_handler,
    delete_scheme_handler,
    detach_team_handler,
    edit_role_handler,
    get_group_statuses_handler,
    get_permission_tree_handler,
    get_role_handler,
    get_scheme_handler,
    list_roles_handler,
    list_scheme_teams_handler,
    list_schemes_handler,
    patch_scheme_handler,
    save_scheme_roles_handler,
    toggle_group_handler,
};
use permission_scheme_service::{AppConfig, AppStateBuilder};

use axum::{Router, routing::get, routing::post, routing::put};
use dotenvy::dotenv;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        permission_scheme_service::interface::http_handlers::create_scheme_handler,
        permission_scheme_service::interface::http_handlers::list_schemes_handler,
        permission_scheme_service::interface::http_handlers::get_scheme_handler,
        permission_scheme_service::interface::http_handlers::patch_scheme_handler,
        permission_scheme_service::interface::http_handlers::delete_scheme_handler,
        permission_scheme_service::interface::http_handlers::attach_team_handler,
        permission_scheme_service::interface::http_handlers::detach_team_handler,
        permission_scheme_service::interface::http_handlers::list_scheme_teams_handler,
        permission_scheme_service::interface::http_handlers::save_scheme_roles_handler,
        permission_scheme_service::interface::http_handlers::list_roles_handler,
        permission_scheme_service::interface::http_handlers::get_role_handler,
        permission_scheme_service::interface::http_handlers::edit_role_handler,
        permission_scheme_service::interface::http_handlers::get_permission_tree_handler,
        permission_scheme_service::interface::http_handlers::get_group_statuses_handler,
        permission_scheme_service::interface::http_handlers::toggle_group_handler,
    ),
    components(schemas(
        CreateSchemeRequest, PatchSchemeRequest, SchemeResponse, SchemesListResponse,
        AttachTeamRequest, SchemeTeamsResponse, SaveSchemeRolesRequest,
        RoleResponse, RolesListResponse, EditRoleRequest,
        PermissionRowResponse, TreeNodeResponse, TreeGroupResponse, PermissionTreeResponse,
        GroupStatusResponse, GroupStatusesResponse, ToggleGroupRequest, ToggleGroupResponse,
        ErrorResponse
    )),
    tags(
        (name = "Schemes", description = "Team override scheme management"),
        (name = "Roles", description = "Role grant set management"),
        (name = "Permissions", description = "Permission tree evaluation")
    )
)]
pub struct ApiDoc;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse environment variables
    let config = AppConfig::from_env().expect("Failed to parse environment variables");

    // Connect to database
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to DB");

    // Setup application state
    let app_state = AppStateBuilder::new()
        .with_pool(pool)
        .with_config(config.clone())
        .build()
        .await
        .expect("Failed to setup application");

    let http_addr = config.http_address();
    let openapi = ApiDoc::openapi();

    let v1_routes = Router::new()
        .route("/admin/schemes", post(create_scheme_handler))
        .route("/admin/schemes", get(list_schemes_handler))
        .route("/admin/schemes/{scheme_id}", get(get_scheme_handler))
        .route("/admin/schemes/{scheme_id}", put(patch_scheme_handler))
        .route(
            "/admin/schemes/{scheme_id}",
            axum::routing::delete(delete_scheme_handler),
        )
        .route(
            "/admin/schemes/{scheme_id}/teams",
            post(attach_team_handler),
        )
        .route(
            "/admin/schemes/{scheme_id}/teams",
            get(list_scheme_teams_handler),
        )
        .route(
            "/admin/schemes/{scheme_id}/teams/{team_id}",
            axum::routing::delete(detach_team_handler),
        )
        .route(
            "/admin/schemes/{scheme_id}/roles",
            put(save_scheme_roles_handler),
        )
        .route("/admin/roles", get(list_roles_handler))
        .route("/admin/roles/{role_id}", get(get_role_handler))
        .route("/admin/roles/{role_id}", put(edit_role_handler))
        .route(
            "/admin/roles/{role_id}/group-statuses",
            get(get_group_statuses_handler),
        )
        .route(
            "/admin/roles/{role_id}/groups/{group_id}/toggle",
            post(toggle_group_handler),
        )
        .route(
            "/admin/permissions/tree",
            get(get_permission_tree_handler),
        );

    let app = Router::new()
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/swagger").url("/openapi.json", openapi.clone()))
        .with_state(app_state);

    let listener = TcpListener::bind(&http_addr).await.expect("Failed to bind");
    println!("HTTP server running at http://{http_addr}");
    axum::serve(listener, app).await.unwrap();
}
