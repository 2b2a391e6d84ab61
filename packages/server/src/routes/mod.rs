use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(user_routes())
        .merge(template_routes(config))
        .merge(hackathon_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::signup))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(
            handlers::auth::add_email,
            handlers::auth::list_emails
        ))
}

fn template_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let crud = OpenApiRouter::new()
        .routes(routes!(handlers::template::create_template))
        .routes(routes!(
            handlers::template::get_template,
            handlers::template::update_template,
            handlers::template::delete_template
        ))
        .routes(routes!(handlers::template::list_templates));

    let upload = OpenApiRouter::new()
        .routes(routes!(handlers::template::create_template_from_file))
        .layer(handlers::template::upload_body_limit(
            config.template.max_upload_bytes,
        ));

    crud.merge(upload)
}

fn hackathon_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::hackathon::create_hackathon))
        .routes(routes!(handlers::hackathon::list_hackathons))
        .routes(routes!(
            handlers::hackathon::get_hackathon,
            handlers::hackathon::update_hackathon,
            handlers::hackathon::delete_hackathon
        ))
        .routes(routes!(handlers::hackathon::check_name_availability))
        .routes(routes!(handlers::hackathon::get_hackathon_by_name))
        .routes(routes!(handlers::hackathon::get_hackathon_stat))
        .routes(routes!(
            handlers::hackathon::create_register,
            handlers::hackathon::list_registers
        ))
        .routes(routes!(handlers::hackathon::update_register))
}
