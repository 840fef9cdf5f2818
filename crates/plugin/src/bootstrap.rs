// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent bootstrap payload
//!
//! Builds the executor task that installs, configures, and runs one CI
//! agent: three ordered processes under a single order constraint. The
//! configure step writes the wrapper and autoregister properties the agent
//! reads at boot, and materializes a quiet logback config via base64 so no
//! quoting survives the shell.

use crate::handler::PLUGIN_ID;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use roster_adapters::{JobKey, JobSpec, OrderConstraint, ProcessSpec, TaskConfig};
use roster_core::{AgentId, LaunchSpec};

/// Fallback agent zip when the cluster profile names no source.
const DEFAULT_AGENT_SOURCE_URL: &str = "https://download.gocd.org/binaries/agent/latest/agent.zip";

const LOGBACK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration scan="true" scanPeriod="5 seconds">
  <appender name="FileAppender" class="ch.qos.logback.core.rolling.RollingFileAppender">
    <file>logs/${LOG_FILE:-go-agent.log}</file>
    <encoder>
      <pattern>%date{ISO8601} %-5level [%thread] %logger{0}:%line - %msg%n</pattern>
    </encoder>
    <rollingPolicy class="ch.qos.logback.core.rolling.FixedWindowRollingPolicy">
      <fileNamePattern>logs/${LOG_FILE:-go-agent.log}.%i</fileNamePattern>
      <minIndex>1</minIndex>
      <maxIndex>4</maxIndex>
    </rollingPolicy>
    <triggeringPolicy class="ch.qos.logback.core.rolling.SizeBasedTriggeringPolicy">
      <maxFileSize>5 MB</maxFileSize>
    </triggeringPolicy>
  </appender>
  <root level="WARN">
    <appender-ref ref="FileAppender"/>
  </root>
</configuration>
"#;

/// Build the executor job for a new agent.
pub fn job_spec(agent_id: &AgentId, spec: &LaunchSpec) -> JobSpec {
    JobSpec {
        key: JobKey {
            role: spec.cluster.role.clone(),
            env: spec.cluster.env.clone(),
            name: spec.agent_name.clone(),
        },
        resources: spec.resources,
        task: TaskConfig {
            finalization_wait: 30,
            max_failures: 1,
            max_concurrency: 0,
            processes: vec![
                install_process(spec),
                configure_process(agent_id, spec),
                run_process(spec),
            ],
            constraints: vec![OrderConstraint {
                order: vec!["install".into(), "configure".into(), "run".into()],
            }],
        },
    }
}

fn install_process(spec: &LaunchSpec) -> ProcessSpec {
    let source_url = spec
        .cluster
        .agent_source_url
        .as_deref()
        .unwrap_or(DEFAULT_AGENT_SOURCE_URL);
    let cmdline = format!(
        "set -e\n\
         wget -O a.zip {source_url}\n\
         unzip a.zip\n\
         rm a.zip\n\
         mv agent-* agent"
    );
    ProcessSpec::new("install", cmdline)
}

fn configure_process(agent_id: &AgentId, spec: &LaunchSpec) -> ProcessSpec {
    let server_url = &spec.cluster.server_api_url;
    let environments = spec.environments.join(",");
    let logback_b64 = BASE64.encode(LOGBACK_XML);

    let cmdline = format!(
        "set -e\n\
         mkdir -p agent/wrapper-config agent/config\n\
         cat > agent/wrapper-config/wrapper-properties.conf <<'EOF'\n\
         wrapper.app.parameter.100=-serverUrl\n\
         wrapper.app.parameter.101={server_url}\n\
         wrapper.port={{{{executor.ports[wrapper]}}}}\n\
         wrapper.jvm.port.min=57345\n\
         wrapper.jvm.port.max=61000\n\
         EOF\n\
         cat > agent/config/autoregister.properties <<'EOF'\n\
         agent.auto.register.key={key}\n\
         agent.auto.register.hostname={hostname}\n\
         agent.auto.register.environments={environments}\n\
         agent.auto.register.elasticAgent.pluginId={plugin_id}\n\
         agent.auto.register.elasticAgent.agentId={agent_id}\n\
         EOF\n\
         echo {logback_b64} | base64 -d > agent/config/logback.xml\n\
         cp agent/config/logback.xml agent/config/agent-bootstrapper-logback.xml\n\
         cp agent/config/logback.xml agent/config/agent-launcher-logback.xml",
        key = spec.auto_register_key,
        hostname = spec.agent_name,
        plugin_id = PLUGIN_ID,
    );
    ProcessSpec::new("configure", cmdline)
}

fn run_process(spec: &LaunchSpec) -> ProcessSpec {
    let mut cmdline = String::new();
    if let Some(init) = &spec.init_script {
        cmdline.push_str(init);
        cmdline.push('\n');
    }
    cmdline.push_str("export PATH=\"$HOME/bin:$PATH\"\n");
    cmdline.push_str("agent/bin/agent console");
    ProcessSpec::new("run", cmdline)
}

#[cfg(test)]
#[path = "bootstrap_tests.rs"]
mod tests;
