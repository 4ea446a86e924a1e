// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright 2026 Edgecast Cloud LLC.

//! Client configuration archives
//!
//! A client configuration archive is a zip file holding a single
//! `<service>-conf/` directory with:
//!
//! - `<type>-site.xml`: the service configuration as Hadoop XML properties
//! - `core-site.xml` (HDFS only): the `fs.*` and `hadoop.*` properties
//! - `hosts`: one line per host running a role of the service

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use cluster_types::ServiceType;
use thiserror::Error;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ServiceError;
use crate::registry::ClientConfigSource;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ArchiveError> for ServiceError {
    fn from(e: ArchiveError) -> Self {
        ServiceError::Internal(format!("Failed to build client configuration: {}", e))
    }
}

/// Generates the client configuration archive of a service.
pub trait ConfigArchiveBuilder: Send + Sync {
    /// MIME type of the generated archive
    fn content_type(&self) -> &'static str {
        "application/octet-stream"
    }

    fn build(&self, source: &ClientConfigSource) -> Result<Vec<u8>, ArchiveError>;
}

/// Builds deflate-compressed zip archives.
#[derive(Debug, Default)]
pub struct ZipArchiveBuilder;

impl ConfigArchiveBuilder for ZipArchiveBuilder {
    fn build(&self, source: &ClientConfigSource) -> Result<Vec<u8>, ArchiveError> {
        let mut buffer = Cursor::new(Vec::new());
        let mut zip = ZipWriter::new(&mut buffer);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let dir = format!("{}-conf", source.service_name);
        let (core, site) = split_core_properties(source.service_type, &source.config);

        if !core.is_empty() {
            zip.start_file(format!("{}/core-site.xml", dir), options)?;
            zip.write_all(render_site_xml(&core).as_bytes())?;
        }

        zip.start_file(
            format!("{}/{}-site.xml", dir, source.service_type.site_file_prefix()),
            options,
        )?;
        zip.write_all(render_site_xml(&site).as_bytes())?;

        zip.start_file(format!("{}/hosts", dir), options)?;
        for host in &source.hosts {
            writeln!(zip, "{}", host)?;
        }

        zip.finish()?;

        Ok(buffer.into_inner())
    }
}

/// HDFS clients read filesystem-wide settings from `core-site.xml`.
fn split_core_properties(
    service_type: ServiceType,
    config: &BTreeMap<String, String>,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    if service_type != ServiceType::Hdfs {
        return (BTreeMap::new(), config.clone());
    }

    config
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .partition(|(k, _)| k.starts_with("fs.") || k.starts_with("hadoop."))
}

fn render_site_xml(properties: &BTreeMap<String, String>) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<configuration>\n");
    for (name, value) in properties {
        xml.push_str("  <property>\n");
        xml.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
        xml.push_str(&format!("    <value>{}</value>\n", escape_xml(value)));
        xml.push_str("  </property>\n");
    }
    xml.push_str("</configuration>\n");
    xml
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
