//! The parts of a `pom.xml` that dependency resolution needs.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::error::PomError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PomDependency {
    pub group_id: String,
    pub artifact_id: String,
    pub version: Option<String>,
    pub dependency_type: Option<String>,
    pub classifier: Option<String>,
    pub scope: Option<String>,
    pub optional: bool,
    /// `(groupId, artifactId)` pairs; `*` matches anything.
    pub exclusions: Vec<(String, String)>,
}

/// A POM as written, before parent inheritance and interpolation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pom {
    pub parent: Option<ParentRef>,
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub version: Option<String>,
    pub packaging: Option<String>,
    pub properties: HashMap<String, String>,
    pub dependency_management: Vec<PomDependency>,
    pub dependencies: Vec<PomDependency>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Dependencies,
    Managed,
}

/// Where a path below `<project>` points into a `<dependency>` element,
/// with the remainder of the path below it.
fn dependency_section<'a, 'b>(path: &'a [&'b str]) -> Option<(Section, &'a [&'b str])> {
    match path {
        ["project", "dependencies", "dependency", rest @ ..] => Some((Section::Dependencies, rest)),
        ["project", "dependencyManagement", "dependencies", "dependency", rest @ ..] => {
            Some((Section::Managed, rest))
        }
        _ => None,
    }
}

#[derive(Default)]
struct ParentAccum {
    group_id: Option<String>,
    artifact_id: Option<String>,
    version: Option<String>,
}

impl ParentAccum {
    fn finish(self) -> Result<ParentRef, PomError> {
        Ok(ParentRef {
            group_id: self.group_id.ok_or(PomError::MissingElement("parent/groupId"))?,
            artifact_id: self
                .artifact_id
                .ok_or(PomError::MissingElement("parent/artifactId"))?,
            version: self.version.ok_or(PomError::MissingElement("parent/version"))?,
        })
    }
}

#[derive(Default)]
struct DependencyAccum {
    group_id: Option<String>,
    artifact_id: Option<String>,
    dependency: PomDependency,
    exclusion: Option<(String, String)>,
}

impl DependencyAccum {
    fn set(&mut self, field: &str, text: String) {
        let dependency = &mut self.dependency;
        match field {
            "groupId" => self.group_id = Some(text),
            "artifactId" => self.artifact_id = Some(text),
            "version" => dependency.version = Some(text),
            "type" => dependency.dependency_type = Some(text),
            "classifier" => dependency.classifier = Some(text),
            "scope" => dependency.scope = Some(text),
            "optional" => dependency.optional = text == "true",
            _ => {}
        }
    }

    fn set_exclusion(&mut self, field: &str, text: String) {
        if let Some((group_id, artifact_id)) = self.exclusion.as_mut() {
            match field {
                "groupId" => *group_id = text,
                "artifactId" => *artifact_id = text,
                _ => {}
            }
        }
    }

    fn finish(mut self) -> Result<PomDependency, PomError> {
        self.dependency.group_id = self
            .group_id
            .ok_or(PomError::MissingElement("dependency/groupId"))?;
        self.dependency.artifact_id = self
            .artifact_id
            .ok_or(PomError::MissingElement("dependency/artifactId"))?;
        Ok(self.dependency)
    }
}

pub fn parse_pom(content: &str) -> Result<Pom, PomError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut pom = Pom::default();
    let mut seen_project = false;
    let mut path: Vec<String> = Vec::new();
    let mut text = String::new();
    let mut parent: Option<ParentAccum> = None;
    let mut dependency: Option<DependencyAccum> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| PomError::Xml(e.to_string()))?;

        match event {
            Event::Start(ref e) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                text.clear();

                let p: Vec<&str> = path.iter().map(String::as_str).collect();
                match p.as_slice() {
                    ["project"] => seen_project = true,
                    ["project", "parent"] => parent = Some(ParentAccum::default()),
                    _ => match dependency_section(&p) {
                        Some((_, [])) => dependency = Some(DependencyAccum::default()),
                        Some((_, ["exclusions", "exclusion"])) => {
                            if let Some(dep) = dependency.as_mut() {
                                dep.exclusion = Some((String::new(), String::new()));
                            }
                        }
                        _ => {}
                    },
                }
            }
            Event::Text(ref e) => match e.decode() {
                Ok(cow) => {
                    let s = cow.trim().to_string();
                    let unescaped = quick_xml::escape::unescape(&s)
                        .map(|c| c.into_owned())
                        .unwrap_or(s);
                    text.push_str(&unescaped);
                }
                Err(_) => text.push_str(String::from_utf8_lossy(e.as_ref()).trim()),
            },
            Event::End(_) => {
                let value = std::mem::take(&mut text);
                let p: Vec<&str> = path.iter().map(String::as_str).collect();

                match p.as_slice() {
                    ["project", "parent"] => {
                        if let Some(accum) = parent.take() {
                            pom.parent = Some(accum.finish()?);
                        }
                    }
                    ["project", "parent", field] => {
                        if let Some(accum) = parent.as_mut() {
                            match *field {
                                "groupId" => accum.group_id = Some(value),
                                "artifactId" => accum.artifact_id = Some(value),
                                "version" => accum.version = Some(value),
                                _ => {}
                            }
                        }
                    }
                    ["project", "groupId"] => pom.group_id = Some(value),
                    ["project", "artifactId"] => pom.artifact_id = Some(value),
                    ["project", "version"] => pom.version = Some(value),
                    ["project", "packaging"] => pom.packaging = Some(value),
                    ["project", "properties", key] => {
                        pom.properties.insert((*key).to_owned(), value);
                    }
                    _ => match dependency_section(&p) {
                        Some((section, [])) => {
                            if let Some(accum) = dependency.take() {
                                let finished = accum.finish()?;
                                match section {
                                    Section::Dependencies => pom.dependencies.push(finished),
                                    Section::Managed => pom.dependency_management.push(finished),
                                }
                            }
                        }
                        Some((_, [field])) => {
                            if let Some(accum) = dependency.as_mut() {
                                accum.set(field, value);
                            }
                        }
                        Some((_, ["exclusions", "exclusion"])) => {
                            if let Some(accum) = dependency.as_mut()
                                && let Some(exclusion) = accum.exclusion.take()
                            {
                                accum.dependency.exclusions.push(exclusion);
                            }
                        }
                        Some((_, ["exclusions", "exclusion", field])) => {
                            if let Some(accum) = dependency.as_mut() {
                                accum.set_exclusion(field, value);
                            }
                        }
                        _ => {}
                    },
                }

                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_project {
        return Err(PomError::MissingElement("project"));
    }
    Ok(pom)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIB_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>3</version>
    <relativePath/>
  </parent>
  <artifactId>lib</artifactId>
  <version>1.0</version>
  <packaging>jar</packaging>
  <properties>
    <guava.version>32.1.0-jre</guava.version>
  </properties>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.slf4j</groupId>
        <artifactId>slf4j-api</artifactId>
        <version>2.0.9</version>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>com.google.guava</groupId>
      <artifactId>guava</artifactId>
      <version>${guava.version}</version>
      <exclusions>
        <exclusion>
          <groupId>com.google.code.findbugs</groupId>
          <artifactId>jsr305</artifactId>
        </exclusion>
      </exclusions>
    </dependency>
    <dependency>
      <groupId>org.slf4j</groupId>
      <artifactId>slf4j-api</artifactId>
    </dependency>
    <dependency>
      <groupId>junit</groupId>
      <artifactId>junit</artifactId>
      <version>4.13.2</version>
      <scope>test</scope>
      <optional>true</optional>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <artifactId>maven-compiler-plugin</artifactId>
        <dependencies>
          <dependency>
            <groupId>ignored</groupId>
            <artifactId>ignored</artifactId>
          </dependency>
        </dependencies>
      </plugin>
    </plugins>
  </build>
</project>"#;

    #[test]
    fn parses_coordinates_and_parent() {
        let pom = parse_pom(LIB_POM).unwrap();
        assert_eq!(pom.group_id, None);
        assert_eq!(pom.artifact_id.as_deref(), Some("lib"));
        assert_eq!(pom.version.as_deref(), Some("1.0"));
        assert_eq!(pom.packaging.as_deref(), Some("jar"));
        assert_eq!(
            pom.parent,
            Some(ParentRef {
                group_id: "org.example".into(),
                artifact_id: "parent".into(),
                version: "3".into(),
            })
        );
    }

    #[test]
    fn parses_properties() {
        let pom = parse_pom(LIB_POM).unwrap();
        assert_eq!(pom.properties["guava.version"], "32.1.0-jre");
    }

    #[test]
    fn separates_managed_and_declared_dependencies() {
        let pom = parse_pom(LIB_POM).unwrap();
        assert_eq!(pom.dependency_management.len(), 1);
        assert_eq!(pom.dependency_management[0].artifact_id, "slf4j-api");
        assert_eq!(pom.dependency_management[0].version.as_deref(), Some("2.0.9"));

        let names: Vec<&str> = pom.dependencies.iter().map(|d| d.artifact_id.as_str()).collect();
        assert_eq!(names, vec!["guava", "slf4j-api", "junit"]);
    }

    #[test]
    fn parses_dependency_details() {
        let pom = parse_pom(LIB_POM).unwrap();
        let guava = &pom.dependencies[0];
        assert_eq!(guava.version.as_deref(), Some("${guava.version}"));
        assert_eq!(
            guava.exclusions,
            vec![("com.google.code.findbugs".to_owned(), "jsr305".to_owned())]
        );

        assert_eq!(pom.dependencies[1].version, None);

        let junit = &pom.dependencies[2];
        assert_eq!(junit.scope.as_deref(), Some("test"));
        assert!(junit.optional);
    }

    #[test]
    fn plugin_dependencies_are_ignored() {
        let pom = parse_pom(LIB_POM).unwrap();
        assert!(pom.dependencies.iter().all(|d| d.group_id != "ignored"));
    }

    #[test]
    fn dependency_without_artifact_id_is_an_error() {
        let xml = "<project><dependencies><dependency><groupId>g</groupId></dependency></dependencies></project>";
        assert!(matches!(
            parse_pom(xml),
            Err(PomError::MissingElement("dependency/artifactId"))
        ));
    }

    #[test]
    fn non_pom_documents_rejected() {
        assert!(matches!(
            parse_pom("<metadata><groupId>g</groupId></metadata>"),
            Err(PomError::MissingElement("project"))
        ));
        assert!(parse_pom("<project><version>1</project>").is_err());
    }
}
