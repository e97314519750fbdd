use crate::html;
use crate::response::{json, json_error, missing_param, not_found, text};
use augur_api::{Mode, OutputFormat};
use augur_core::{QueryRequest, ServiceContext};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

type Ctx = State<Arc<ServiceContext>>;

pub async fn index(State(ctx): Ctx) -> Html<String> {
    let modes: Vec<Mode> = Mode::ALL
        .into_iter()
        .filter(|m| ctx.coordinator().supports(*m))
        .collect();
    Html(html::index_page(ctx.index(), &modes, &ctx.snapshot().roots))
}

#[derive(Debug, Deserialize)]
pub struct SourceParams {
    file: Option<String>,
    s: Option<usize>,
    e: Option<usize>,
}

pub async fn source(State(ctx): Ctx, Query(params): Query<SourceParams>) -> Response {
    let Some(file) = params.file else {
        return missing_param("file");
    };
    let content = match read_indexed(&ctx, &file).await {
        Ok(content) => content,
        Err(resp) => return resp,
    };
    let selection = params.s.map(|s| (s, params.e.unwrap_or(s)));
    Html(html::source_page(Path::new(&file), &content, selection)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct FileParams {
    path: Option<String>,
}

pub async fn file(State(ctx): Ctx, Query(params): Query<FileParams>) -> Response {
    let Some(path) = params.path else {
        return missing_param("path");
    };
    match read_indexed(&ctx, &path).await {
        Ok(content) => text(StatusCode::OK, content),
        Err(resp) => resp,
    }
}

/// Contents of a file that belongs to the loaded program.
async fn read_indexed(ctx: &ServiceContext, path: &str) -> Result<String, Response> {
    if !ctx.index().contains_file(Path::new(path)) {
        return Err(not_found(path));
    }
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) => {
            warn!(path, error = %e, "cannot read program file");
            Err(not_found(path))
        }
    }
}

pub async fn query(State(ctx): Ctx, Query(request): Query<QueryRequest>) -> Response {
    if ctx.config().verbose {
        info!(
            mode = %request.mode,
            pos = %request.pos,
            format = %request.format,
            scope = %request.scope,
            "query"
        );
    } else {
        debug!(
            mode = %request.mode,
            pos = %request.pos,
            format = %request.format,
            scope = %request.scope,
            "query"
        );
    }

    let wants_json = request.format == OutputFormat::Json.as_str();
    match ctx.coordinator().run_query(&request).await {
        Ok(answer) => {
            let command = ctx.command_line_for(&answer.query);
            match answer.query.format {
                OutputFormat::Json => json(
                    StatusCode::OK,
                    &serde_json::json!({
                        "command": command,
                        "mode": answer.query.mode.as_str(),
                        "result": answer.output.into_json(),
                    }),
                ),
                OutputFormat::Plain => text(
                    StatusCode::OK,
                    format!("{command}\n\n{}", answer.output.to_text()),
                ),
            }
        }
        Err(e) => {
            let status = if e.is_validation() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::UNPROCESSABLE_ENTITY
            };
            if wants_json {
                json_error(status, e.to_string())
            } else {
                text(status, e.to_string())
            }
        }
    }
}
