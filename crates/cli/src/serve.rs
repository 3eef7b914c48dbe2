//! `tabmerge serve` — web upload front end.
//!
//! Two routes: `GET /` serves the upload form, `POST /transfer` runs the
//! merge on the uploaded pair and streams the result back as a download.

use axum::extract::Multipart;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tabmerge_core::{merge, MergeError};
use tabmerge_io::{xlsx, OUTPUT_FILE_NAME};

use crate::CliError;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="pt">
<head>
  <meta charset="utf-8">
  <title>Tabmerge</title>
</head>
<body>
  <h1>Combinar planilhas</h1>
  <form action="/transfer" method="post" enctype="multipart/form-data">
    <p><label>Primeiro arquivo:
      <input type="file" name="arquivo1" required></label></p>
    <p><label>Coluna comum do primeiro arquivo:
      <input type="text" name="coluna_comum_arquivo1" required></label></p>
    <p><label>Segundo arquivo:
      <input type="file" name="arquivo2" required></label></p>
    <p><label>Coluna comum do segundo arquivo:
      <input type="text" name="coluna_comum_arquivo2" required></label></p>
    <p><button type="submit">Combinar</button></p>
  </form>
</body>
</html>
"#;

pub fn cmd_serve(listen: &str) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| CliError::io(e.to_string()))?;
    runtime.block_on(async {
        let app = Router::new()
            .route("/", get(index))
            .route("/transfer", post(transfer));

        let listener = tokio::net::TcpListener::bind(listen)
            .await
            .map_err(|e| CliError::io(format!("cannot bind {listen}: {e}")))?;
        tracing::info!(%listen, "listening");
        axum::serve(listener, app)
            .await
            .map_err(|e| CliError::io(e.to_string()))
    })
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

struct TransferForm {
    arquivo1: Vec<u8>,
    arquivo2: Vec<u8>,
    coluna1: String,
    coluna2: String,
}

enum TransferError {
    /// Bad upload: malformed form or unparseable spreadsheet payload.
    BadRequest(String),
    /// Valid upload the merge rejected (missing column, no matching rows).
    Merge(MergeError),
    /// Result serialization failed.
    Internal(String),
}

fn transfer_error_status(err: &TransferError) -> StatusCode {
    match err {
        TransferError::BadRequest(_) => StatusCode::BAD_REQUEST,
        TransferError::Merge(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TransferError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn transfer(mut multipart: Multipart) -> Response {
    let form = match collect_form(&mut multipart).await {
        Ok(form) => form,
        Err(message) => {
            tracing::warn!(%message, "rejected upload");
            return (StatusCode::BAD_REQUEST, message).into_response();
        }
    };

    // The merge pipeline is synchronous; keep it off the async workers.
    let result = tokio::task::block_in_place(|| run_transfer(&form));

    match result {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{OUTPUT_FILE_NAME}\""),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            let status = transfer_error_status(&err);
            let message = match err {
                TransferError::BadRequest(msg) | TransferError::Internal(msg) => msg,
                TransferError::Merge(err) => err.to_string(),
            };
            tracing::warn!(%status, %message, "merge request failed");
            (status, message).into_response()
        }
    }
}

async fn collect_form(multipart: &mut Multipart) -> Result<TransferForm, String> {
    let mut arquivo1 = None;
    let mut arquivo2 = None;
    let mut coluna1 = None;
    let mut coluna2 = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("malformed multipart body: {e}"))?
    {
        let read_err = |e| format!("failed reading field: {e}");
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("arquivo1") => arquivo1 = Some(field.bytes().await.map_err(read_err)?.to_vec()),
            Some("arquivo2") => arquivo2 = Some(field.bytes().await.map_err(read_err)?.to_vec()),
            Some("coluna_comum_arquivo1") => coluna1 = Some(field.text().await.map_err(read_err)?),
            Some("coluna_comum_arquivo2") => coluna2 = Some(field.text().await.map_err(read_err)?),
            _ => {}
        }
    }

    Ok(TransferForm {
        arquivo1: arquivo1.ok_or("missing field 'arquivo1'")?,
        arquivo2: arquivo2.ok_or("missing field 'arquivo2'")?,
        coluna1: coluna1.ok_or("missing field 'coluna_comum_arquivo1'")?,
        coluna2: coluna2.ok_or("missing field 'coluna_comum_arquivo2'")?,
    })
}

fn run_transfer(form: &TransferForm) -> Result<Vec<u8>, TransferError> {
    let table1 =
        xlsx::read_table_from_bytes(&form.arquivo1).map_err(TransferError::BadRequest)?;
    let table2 =
        xlsx::read_table_from_bytes(&form.arquivo2).map_err(TransferError::BadRequest)?;
    tracing::info!(
        rows1 = table1.row_count(),
        rows2 = table2.row_count(),
        "parsed upload"
    );

    let merged = merge(table1, table2, &form.coluna1, &form.coluna2)
        .map_err(TransferError::Merge)?;
    tracing::info!(
        rows = merged.summary.result_rows,
        keys = merged.summary.common_keys,
        "merge complete"
    );

    xlsx::write_table_to_bytes(&merged.table).map_err(TransferError::Internal)
}
