//! Embedded builtin configuration: the guaranteed-available fallback.
//!
//! Constructed in code rather than parsed from an asset so loading it
//! cannot fail. Ships one tool per strategy kind, each with the
//! official registry plus well-known mirrors, so the binary is useful
//! before any configuration source has been registered.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::config::model::{
    BackupConfiguration, CommandGet, CommandSet, DetectionConfiguration, EnsureStructure,
    JsonPathGet, JsonPathSet, KeyValueGet, KeyValueSet, OutputParser, RegexGet, RegexSet,
    SourceConfiguration, StrategyConfiguration, ToolConfiguration, ToolsConfiguration, XmlGet,
    XmlSet,
};
use crate::config::ConfigSource;
use crate::error::MirrorSwitchError;

pub const BUILTIN_SOURCE_ID: &str = "builtin";

pub struct BuiltinSource;

#[async_trait]
impl ConfigSource for BuiltinSource {
    fn id(&self) -> &str {
        BUILTIN_SOURCE_ID
    }

    fn name(&self) -> &str {
        "Builtin"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    async fn load(&self) -> Result<ToolsConfiguration, MirrorSwitchError> {
        Ok(configuration())
    }
}

fn source(id: &str, name: &str, url: &str, region: Option<&str>) -> SourceConfiguration {
    SourceConfiguration {
        id: id.into(),
        name: name.into(),
        url: url.into(),
        description: None,
        region: region.map(str::to_string),
        requires_auth: false,
        auth: None,
        config_source_id: None,
        config_source_name: None,
        config_source_is_builtin: None,
    }
}

fn detection(command: &str, arguments: &[&str]) -> DetectionConfiguration {
    DetectionConfiguration {
        command: command.into(),
        arguments: arguments.iter().map(|s| (*s).to_string()).collect(),
        custom_paths: vec![],
        fallback_detection: None,
    }
}

fn args(arguments: &[&str]) -> Vec<String> {
    arguments.iter().map(|s| (*s).to_string()).collect()
}

fn npm() -> ToolConfiguration {
    ToolConfiguration {
        id: "npm".into(),
        name: "npm".into(),
        description: Some("Node.js package manager".into()),
        detection: detection("npm", &["--version"]),
        sources: vec![
            source("npmjs", "npmjs (official)", "https://registry.npmjs.org/", None),
            source("npmmirror", "npmmirror", "https://registry.npmmirror.com/", Some("CN")),
            source("tencent", "Tencent", "https://mirrors.cloud.tencent.com/npm/", Some("CN")),
        ],
        strategy: StrategyConfiguration::Keyvalue {
            set: KeyValueSet {
                file_path: "~/.npmrc".into(),
                key: "registry".into(),
                value: "{{url}}".into(),
                comment: None,
                separator: "=".into(),
            },
            get: KeyValueGet {
                file_path: "~/.npmrc".into(),
                key: "registry".into(),
                separator: "=".into(),
            },
        },
        backup: Some(BackupConfiguration {
            file_path: "~/.npmrc".into(),
            backup_file_name: "npmrc.backup".into(),
            backup_original: true,
            original_backup_suffix: None,
        }),
        metadata: None,
        post_actions: vec![],
    }
}

fn yarn() -> ToolConfiguration {
    ToolConfiguration {
        id: "yarn".into(),
        name: "Yarn".into(),
        description: Some("Alternative Node.js package manager".into()),
        detection: detection("yarn", &["--version"]),
        sources: vec![
            source("npmjs", "npmjs (official)", "https://registry.npmjs.org/", None),
            source("npmmirror", "npmmirror", "https://registry.npmmirror.com/", Some("CN")),
        ],
        strategy: StrategyConfiguration::Command {
            set: CommandSet {
                command: "yarn".into(),
                arguments: args(&["config", "set", "registry", "{{url}}"]),
                environment: HashMap::new(),
                requires_admin: false,
                working_directory: None,
                pre_commands: vec![],
                timeout: None,
            },
            get: CommandGet {
                command: "yarn".into(),
                arguments: args(&["config", "get", "registry"]),
                output_parser: OutputParser::Trim,
                parser_pattern: None,
                timeout: None,
            },
        },
        backup: None,
        metadata: None,
        post_actions: vec![],
    }
}

fn docker() -> ToolConfiguration {
    ToolConfiguration {
        id: "docker".into(),
        name: "Docker".into(),
        description: Some("Container runtime registry mirrors".into()),
        detection: detection("docker", &["--version"]),
        sources: vec![
            source("dockerhub", "Docker Hub (official)", "https://registry-1.docker.io/", None),
            source("daocloud", "DaoCloud", "https://docker.m.daocloud.io/", Some("CN")),
            source("ustc", "USTC", "https://docker.mirrors.ustc.edu.cn/", Some("CN")),
        ],
        strategy: StrategyConfiguration::Jsonpath {
            set: JsonPathSet {
                file_path: "~/.docker/daemon.json".into(),
                jsonpath: "registry-mirrors".into(),
                value: serde_json::json!(["{{url}}"]),
                merge_strategy: None,
                ensure_structure: Some(EnsureStructure {
                    create_if_missing: true,
                    default_structure: None,
                    create_parent_directories: true,
                }),
            },
            get: JsonPathGet {
                file_path: "~/.docker/daemon.json".into(),
                jsonpath: "registry-mirrors".into(),
            },
        },
        backup: Some(BackupConfiguration {
            file_path: "~/.docker/daemon.json".into(),
            backup_file_name: "daemon.json.backup".into(),
            backup_original: true,
            original_backup_suffix: None,
        }),
        metadata: None,
        post_actions: vec![],
    }
}

fn maven() -> ToolConfiguration {
    let default_structure = concat!(
        "<settings xmlns=\"http://maven.apache.org/SETTINGS/1.0.0\">\n",
        "  <mirrors>\n",
        "    <mirror>\n",
        "      <id>{{id}}</id>\n",
        "      <name>{{name}}</name>\n",
        "      <url>{{url}}</url>\n",
        "      <mirrorOf>central</mirrorOf>\n",
        "    </mirror>\n",
        "  </mirrors>\n",
        "</settings>\n"
    );

    ToolConfiguration {
        id: "maven".into(),
        name: "Apache Maven".into(),
        description: Some("Java build tool central-repository mirror".into()),
        detection: detection("mvn", &["--version"]),
        sources: vec![
            source("central", "Maven Central (official)", "https://repo.maven.apache.org/maven2/", None),
            source("aliyun", "Aliyun", "https://maven.aliyun.com/repository/public/", Some("CN")),
        ],
        strategy: StrategyConfiguration::Xml {
            set: XmlSet {
                file_path: "~/.m2/settings.xml".into(),
                xpath: "//settings/mirrors/mirror/url".into(),
                value: "{{url}}".into(),
                namespaces: HashMap::new(),
                ensure_structure: Some(EnsureStructure {
                    create_if_missing: true,
                    default_structure: Some(default_structure.into()),
                    create_parent_directories: true,
                }),
            },
            get: XmlGet {
                file_path: "~/.m2/settings.xml".into(),
                xpath: "//settings/mirrors/mirror/url".into(),
                namespaces: HashMap::new(),
                attribute: None,
            },
        },
        backup: Some(BackupConfiguration {
            file_path: "~/.m2/settings.xml".into(),
            backup_file_name: "settings.xml.backup".into(),
            backup_original: true,
            original_backup_suffix: None,
        }),
        metadata: None,
        post_actions: vec![],
    }
}

fn rubygems() -> ToolConfiguration {
    ToolConfiguration {
        id: "rubygems".into(),
        name: "RubyGems".into(),
        description: Some("Ruby package source in ~/.gemrc".into()),
        detection: detection("gem", &["--version"]),
        sources: vec![
            source("rubygems", "rubygems.org (official)", "https://rubygems.org/", None),
            source("ruby-china", "Ruby China", "https://gems.ruby-china.com/", Some("CN")),
        ],
        strategy: StrategyConfiguration::Regex {
            set: RegexSet {
                file_path: "~/.gemrc".into(),
                pattern: r"(-\s*)https?://\S+".into(),
                replacement: "${1}{{url}}".into(),
                global: false,
                options: vec![],
            },
            get: RegexGet {
                file_path: "~/.gemrc".into(),
                pattern: r"-\s*(https?://\S+)".into(),
                capture_group: 1,
            },
        },
        backup: Some(BackupConfiguration {
            file_path: "~/.gemrc".into(),
            backup_file_name: "gemrc.backup".into(),
            backup_original: false,
            original_backup_suffix: None,
        }),
        metadata: None,
        post_actions: vec![],
    }
}

/// The embedded configuration. One tool per strategy kind.
#[must_use]
pub fn configuration() -> ToolsConfiguration {
    ToolsConfiguration {
        version: "1.0.0".into(),
        tools: vec![npm(), yarn(), docker(), maven(), rubygems()],
    }
}
