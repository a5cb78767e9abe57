//! `maven-metadata.xml` at the artifact level: the versions a module has.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::PomError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenMetadata {
    pub group_id: String,
    pub artifact_id: String,
    pub latest: Option<String>,
    pub release: Option<String>,
    pub versions: Vec<String>,
}

fn xml_error(err: impl std::fmt::Display) -> PomError {
    PomError::Xml(err.to_string())
}

impl MavenMetadata {
    pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            ..Self::default()
        }
    }

    pub fn parse(content: &str) -> Result<Self, PomError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut metadata = Self::default();
        let mut path: Vec<String> = Vec::new();
        let mut text = String::new();

        loop {
            match reader.read_event().map_err(xml_error)? {
                Event::Start(ref e) => {
                    path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    text.clear();
                }
                Event::Text(ref e) => {
                    text.push_str(e.decode().map_err(xml_error)?.trim());
                }
                Event::End(_) => {
                    let value = std::mem::take(&mut text);
                    let p: Vec<&str> = path.iter().map(String::as_str).collect();
                    match p.as_slice() {
                        ["metadata", "groupId"] => metadata.group_id = value,
                        ["metadata", "artifactId"] => metadata.artifact_id = value,
                        ["metadata", "versioning", "latest"] => metadata.latest = Some(value),
                        ["metadata", "versioning", "release"] => metadata.release = Some(value),
                        ["metadata", "versioning", "versions", "version"] => {
                            metadata.versions.push(value);
                        }
                        _ => {}
                    }
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if metadata.artifact_id.is_empty() {
            return Err(PomError::MissingElement("artifactId"));
        }
        Ok(metadata)
    }

    /// Record a newly deployed version. It becomes the latest version, and
    /// the latest release unless it is a snapshot.
    pub fn add_version(&mut self, version: &str) {
        if !self.versions.iter().any(|v| v == version) {
            self.versions.push(version.to_owned());
        }
        self.latest = Some(version.to_owned());
        if !reposync::version::is_snapshot(version) {
            self.release = Some(version.to_owned());
        }
    }

    pub fn to_xml(&self) -> Result<String, PomError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;

        start(&mut writer, "metadata")?;
        text_element(&mut writer, "groupId", &self.group_id)?;
        text_element(&mut writer, "artifactId", &self.artifact_id)?;
        start(&mut writer, "versioning")?;
        if let Some(latest) = &self.latest {
            text_element(&mut writer, "latest", latest)?;
        }
        if let Some(release) = &self.release {
            text_element(&mut writer, "release", release)?;
        }
        start(&mut writer, "versions")?;
        for version in &self.versions {
            text_element(&mut writer, "version", version)?;
        }
        end(&mut writer, "versions")?;
        end(&mut writer, "versioning")?;
        end(&mut writer, "metadata")?;

        String::from_utf8(writer.into_inner()).map_err(xml_error)
    }
}

fn start(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), PomError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)
}

fn end(writer: &mut Writer<Vec<u8>>, name: &str) -> Result<(), PomError> {
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)
}

fn text_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &str) -> Result<(), PomError> {
    start(writer, name)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(xml_error)?;
    end(writer, name)
}
