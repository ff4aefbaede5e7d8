use anyhow::{bail, Context};
use clap::Parser;
use groups_broker::utils::{logger, validation::Validate};
use groups_broker::{CliConfig, GroupsAdaptor, MemberRole, NewGroup, NewMember, ServiceConfig};

// Command-file driver. Reads a pipe-delimited command file and dispatches
// each line to the adaptor:
//
//   group_create|<email>|<name>|<description>
//   group_delete|<key>
//   group_info|<key>
//   group_list
//   group_member_add|<group>|<email>|<role>
//   group_member_list|<group>
//   group_member_delete|<group>|<email>
//   group_settings|<description>
//   group_migration_insert|<group>|<message file, or - for a sample message>
//
// Blank lines and lines starting with # are skipped.

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting groups-broker driver");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match ServiceConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("❌ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    match run_commands(&config, &cli.commands).await {
        Ok(executed) => {
            tracing::info!("✅ Executed {} commands", executed);
            println!("✅ Executed {} commands", executed);
        }
        Err(e) => {
            tracing::error!("❌ Command file failed: {:#}", e);
            eprintln!("❌ {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn run_commands(config: &ServiceConfig, commands_path: &str) -> anyhow::Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_path(commands_path)
        .with_context(|| format!("cannot open command file [{}]", commands_path))?;

    let mut executed = 0;
    for record in reader.records() {
        let record = record?;
        let fields: Vec<&str> = record.iter().map(str::trim).collect();
        if fields.is_empty() || fields[0].is_empty() {
            continue;
        }
        run_command(config, &fields)
            .await
            .with_context(|| format!("command [{}]", fields.join("|")))?;
        executed += 1;
    }

    Ok(executed)
}

async fn run_command(config: &ServiceConfig, fields: &[&str]) -> anyhow::Result<()> {
    let command = fields[0];
    match command {
        "group_create" => {
            check_args(fields, 4)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            let new_group = NewGroup {
                email: fields[1].to_string(),
                name: fields[2].to_string(),
                description: Some(fields[3].to_string()),
            };
            // A group that already exists is fine for the driver's purposes.
            match adaptor.insert_new_group(&new_group).await {
                Ok(result) => print_result(command, result),
                Err(e) if e.status_code() == Some(409) => {
                    println!("{}: >>> DUPLICATE <<< {}", command, fields[1]);
                }
                Err(e) => return Err(e.into()),
            }
        }
        "group_delete" => {
            check_args(fields, 2)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            print_result(command, adaptor.delete_group(fields[1]).await?);
        }
        "group_info" => {
            check_args(fields, 2)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            print_result(command, adaptor.get_group_info(fields[1]).await?);
        }
        "group_list" => {
            check_args(fields, 1)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            print_result(command, adaptor.list_groups(None).await?);
        }
        "group_member_add" => {
            check_args(fields, 4)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            let new_member = NewMember {
                email: fields[2].to_string(),
                role: parse_role(fields[3])?,
            };
            print_result(command, adaptor.insert_member(fields[1], &new_member).await?);
        }
        "group_member_list" => {
            check_args(fields, 2)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            print_result(command, adaptor.list_members(fields[1]).await?);
        }
        "group_member_delete" => {
            check_args(fields, 3)?;
            let adaptor = GroupsAdaptor::from_config(config, "directory")?;
            print_result(command, adaptor.delete_member(fields[1], fields[2]).await?);
        }
        "group_settings" => {
            check_args(fields, 2)?;
            let adaptor = GroupsAdaptor::from_config(config, "settings")?;
            // Only wholesale replacement works against the remote API, so
            // fetch the full document, amend it, and send it all back.
            let current = adaptor
                .get_group_settings()
                .await?
                .context("settings read returned no body")?;
            let mut settings: serde_json::Value = serde_json::from_str(&current)?;
            settings["description"] = serde_json::Value::String(fields[1].to_string());
            print_result(command, adaptor.update_group_settings(&settings).await?);
        }
        "group_migration_insert" => {
            check_args(fields, 3)?;
            let adaptor = GroupsAdaptor::from_config(config, "migration")?;
            let message = if fields[2] == "-" {
                sample_message(fields[1])
            } else {
                std::fs::read_to_string(fields[2])
                    .with_context(|| format!("cannot read message file [{}]", fields[2]))?
            };
            print_result(command, adaptor.insert_archive(fields[1], &message).await?);
        }
        other => {
            println!(">>>>>>>>> not implemented: [{}]", other);
        }
    }

    Ok(())
}

fn check_args(fields: &[&str], required: usize) -> anyhow::Result<()> {
    if fields.len() != required {
        bail!(
            "wrong number of args for {}: {} required, got {}",
            fields[0],
            required,
            fields.len()
        );
    }
    Ok(())
}

fn parse_role(raw: &str) -> anyhow::Result<MemberRole> {
    match raw.to_ascii_uppercase().as_str() {
        "OWNER" => Ok(MemberRole::Owner),
        "MANAGER" => Ok(MemberRole::Manager),
        "MEMBER" => Ok(MemberRole::Member),
        other => bail!("unknown member role: [{}]", other),
    }
}

fn print_result(command: &str, result: Option<String>) {
    match result {
        Some(body) => println!("{}: {}", command, body),
        None => println!("{}: ok", command),
    }
}

/// A minimal RFC 822 message for archive-insert smoke runs.
fn sample_message(group_id: &str) -> String {
    let now = chrono::Utc::now();
    format!(
        "Message-ID: <{}-{}>\r\n\
         Date: {}\r\n\
         To: {}\r\n\
         From: \"Groups Broker Driver\" <driver@example.edu>\r\n\
         Subject: Archive insert test {}\r\n\
         \r\n\
         This is a test.\r\n",
        now.timestamp_millis(),
        group_id,
        now.to_rfc2822(),
        group_id,
        now.to_rfc3339()
    )
}
