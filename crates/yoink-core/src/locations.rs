//! Locations Resolver (C3): produces a `FilesReport` from either the
//! location service or a JSON file on disk, then filters and annotates it.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;

use crate::errors::{YoinkError, YoinkResult};
use crate::request::{Locator, Request};
use crate::settings::Settings;

const DSOC_CLUSTER: &str = "DSOC";
const LOCATOR_SERVICE_TIMEOUT: Duration = Duration::from_secs(30);

const FILE_SPEC_KEYS: &[&str] = &[
    "ngas_file_id",
    "subdirectory",
    "relative_path",
    "checksum",
    "checksum_type",
    "version",
    "size",
    "server",
];
const SERVER_KEYS: &[&str] = &["server", "location", "cluster"];

/// Whether a file is fetched via NGAS's direct-copy plugin or streamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrieveMethod {
    Stream,
    Copy,
}

/// A storage server, annotated with how to retrieve from it once a plan has
/// been built.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerRef {
    pub host: String,
    pub location: String,
    pub cluster: String,
    pub retrieve_method: Option<RetrieveMethod>,
}

/// A single file to retrieve, plus the server that holds it.
#[derive(Debug, Clone)]
pub struct FileSpec {
    pub ngas_file_id: String,
    pub subdirectory: Option<String>,
    pub relative_path: String,
    pub checksum: String,
    pub checksum_type: String,
    pub version: i64,
    pub size: u64,
    pub server: ServerRef,
}

/// Ordered sequence of files making up a product.
pub type FilesReport = Vec<FileSpec>;

/// One server's worth of files, after grouping.
#[derive(Debug, Clone)]
pub struct ServerGroup {
    pub host: String,
    pub location: String,
    pub cluster: String,
    pub retrieve_method: RetrieveMethod,
    pub files: Vec<FileSpec>,
}

/// Files grouped by the server that holds them.
pub type ServersReport = HashMap<String, ServerGroup>;

/// Resolve the Request into a (filtered, annotated) files report.
pub fn resolve(request: &Request, settings: &Settings) -> YoinkResult<FilesReport> {
    let value = match &request.locator {
        Locator::LocationFile(path) => fetch_from_file(path)?,
        Locator::ProductLocator(locator) => fetch_from_service(settings, locator)?,
    };

    let mut files = parse_files_report(&value)?;

    if request.sdm_only {
        files.retain(|f| f.relative_path.ends_with(".xml") || f.relative_path.ends_with(".bin"));
    }

    if files.is_empty() {
        return Err(YoinkError::NoLocator(locator_description(&request.locator)));
    }

    annotate_retrieve_method(&mut files, settings);

    Ok(files)
}

fn locator_description(locator: &Locator) -> String {
    match locator {
        Locator::ProductLocator(id) => id.clone(),
        Locator::LocationFile(path) => path.display().to_string(),
    }
}

/// Group a resolved files report by server host.
pub fn group_by_server(files: &FilesReport) -> ServersReport {
    let mut result: ServersReport = HashMap::new();
    for file in files {
        let server = &file.server;
        let retrieve_method = server
            .retrieve_method
            .expect("files must be annotated with a retrieve method before grouping");
        result
            .entry(server.host.clone())
            .or_insert_with(|| ServerGroup {
                host: server.host.clone(),
                location: server.location.clone(),
                cluster: server.cluster.clone(),
                retrieve_method,
                files: Vec::new(),
            })
            .files
            .push(file.clone());
    }
    result
}

fn annotate_retrieve_method(files: &mut FilesReport, settings: &Settings) {
    for file in files.iter_mut() {
        let method = if file.server.cluster == DSOC_CLUSTER
            && file.server.location == settings.execution_site
        {
            RetrieveMethod::Copy
        } else {
            RetrieveMethod::Stream
        };
        file.server.retrieve_method = Some(method);
    }
}

fn fetch_from_file(path: &Path) -> YoinkResult<Value> {
    let mut contents = String::new();
    std::fs::File::open(path)
        .map_err(|e| YoinkError::FileError(format!("{}: {e}", path.display())))?
        .read_to_string(&mut contents)
        .map_err(|e| YoinkError::FileError(format!("{}: {e}", path.display())))?;
    serde_json::from_str(&contents)
        .map_err(|e| YoinkError::FileError(format!("{}: invalid JSON: {e}", path.display())))
}

fn fetch_from_service(settings: &Settings, locator: &str) -> YoinkResult<Value> {
    let client = reqwest::blocking::Client::builder()
        .timeout(LOCATOR_SERVICE_TIMEOUT)
        .build()
        .map_err(|e| YoinkError::LocationServiceError(e.to_string()))?;

    let response = client
        .get(&settings.locator_service_url)
        .query(&[("locator", locator)])
        .send()
        .map_err(|e| {
            if e.is_timeout() {
                YoinkError::LocationServiceTimeout
            } else if e.is_redirect() {
                YoinkError::LocationServiceRedirects
            } else {
                YoinkError::LocationServiceError(e.to_string())
            }
        })?;

    match response.status().as_u16() {
        200 => response
            .json()
            .map_err(|e| YoinkError::LocationServiceError(format!("bad response body: {e}"))),
        404 => Err(YoinkError::NoLocator(locator.to_string())),
        other => Err(YoinkError::LocationServiceError(format!(
            "locator service returned status {other}"
        ))),
    }
}

fn parse_files_report(value: &Value) -> YoinkResult<FilesReport> {
    let files = value
        .get("files")
        .and_then(Value::as_array)
        .ok_or_else(|| YoinkError::MissingSetting("files".to_string()))?;

    files.iter().map(parse_file_spec).collect()
}

fn parse_file_spec(value: &Value) -> YoinkResult<FileSpec> {
    let object = value
        .as_object()
        .ok_or_else(|| YoinkError::MissingSetting("file spec must be an object".to_string()))?;

    for key in FILE_SPEC_KEYS {
        if !object.contains_key(*key) {
            return Err(YoinkError::MissingSetting(format!(
                "file spec missing required key '{key}'"
            )));
        }
    }

    let server_value = &object["server"];
    let server_object = server_value
        .as_object()
        .ok_or_else(|| YoinkError::MissingSetting("server must be an object".to_string()))?;
    for key in SERVER_KEYS {
        if !server_object.contains_key(*key) {
            return Err(YoinkError::MissingSetting(format!(
                "server missing required key '{key}'"
            )));
        }
    }

    let server = ServerRef {
        host: as_str(server_value, "server")?,
        location: as_str(server_value, "location")?,
        cluster: as_str(server_value, "cluster")?,
        retrieve_method: None,
    };

    Ok(FileSpec {
        ngas_file_id: as_str(value, "ngas_file_id")?,
        subdirectory: object
            .get("subdirectory")
            .and_then(Value::as_str)
            .map(str::to_string),
        relative_path: as_str(value, "relative_path")?,
        checksum: as_str(value, "checksum")?,
        checksum_type: as_str(value, "checksum_type")?,
        version: object
            .get("version")
            .and_then(Value::as_i64)
            .ok_or_else(|| YoinkError::MissingSetting("version must be an integer".to_string()))?,
        size: object
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| {
                YoinkError::MissingSetting("size must be a non-negative integer".to_string())
            })?,
        server,
    })
}

fn as_str(value: &Value, key: &str) -> YoinkResult<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| YoinkError::MissingSetting(format!("'{key}' must be a string")))
}
