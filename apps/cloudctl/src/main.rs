// apps/cloudctl/src/main.rs

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::process;

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::{Arg, ArgAction, ArgMatches, Command};
use cloud_core::Environment;
use object_storage::{
    create_object_storage, default_object_storage_providers, ObjectStorage, ObjectStorageManager,
    GOOGLE_CLOUD_STORAGE, STORAGE_PROVIDER,
};
use secrecy::ExposeSecret;
use secrets::{
    create_environment_service, create_secrets_provider, default_environment_providers,
    default_secret_providers, GOOGLE_SECRETS_MANAGER, SECRETS_PROVIDER,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn provider_arg() -> Arg {
    Arg::new("provider")
        .long("provider")
        .global(true)
        .help("Registry id of the provider to use")
}

fn tag_arg() -> Arg {
    Arg::new("tag")
        .long("tag")
        .action(ArgAction::Append)
        .value_name("KEY=VALUE")
        .help("Tag to attach (repeatable)")
}

fn cli() -> Command {
    Command::new("cloudctl")
        .about("Secrets and object storage through pluggable cloud providers")
        .subcommand_required(true)
        .arg(provider_arg())
        .subcommand(
            Command::new("secret")
                .about("Read and write secrets")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("put")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("delete").arg(Arg::new("key").required(true))),
        )
        .subcommand(
            Command::new("env")
                .about("Read and load environment values")
                .subcommand_required(true)
                .subcommand(Command::new("get").arg(Arg::new("name").required(true)))
                .subcommand(
                    Command::new("load")
                        .about("Save every entry of a dotenv file")
                        .arg(Arg::new("file").required(true)),
                ),
        )
        .subcommand(
            Command::new("bucket")
                .about("Manage buckets")
                .subcommand_required(true)
                .subcommand(Command::new("list"))
                .subcommand(Command::new("info").arg(Arg::new("name").required(true)))
                .subcommand(
                    Command::new("create")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("public")
                                .long("public")
                                .action(ArgAction::SetTrue)
                                .help("Make the bucket publicly readable"),
                        )
                        .arg(tag_arg()),
                )
                .subcommand(Command::new("delete").arg(Arg::new("name").required(true))),
        )
        .subcommand(
            Command::new("object")
                .about("Manage objects in a bucket")
                .subcommand_required(true)
                .subcommand(
                    Command::new("put")
                        .arg(Arg::new("bucket").required(true))
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("file").long("file").required(true))
                        .arg(tag_arg()),
                )
                .subcommand(
                    Command::new("get")
                        .arg(Arg::new("bucket").required(true))
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("file").long("file").help("Write to a file instead of stdout")),
                )
                .subcommand(
                    Command::new("ls")
                        .arg(Arg::new("bucket").required(true))
                        .arg(Arg::new("prefix")),
                )
                .subcommand(
                    Command::new("rm")
                        .arg(Arg::new("bucket").required(true))
                        .arg(Arg::new("key").required(true)),
                ),
        )
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let env = Environment::from_process();

    let result = match matches.subcommand() {
        Some(("secret", m)) => run_secret(m, &env).await,
        Some(("env", m)) => run_env(m, &env).await,
        Some(("bucket", m)) => run_bucket(m, &env).await,
        Some(("object", m)) => run_object(m, &env).await,
        _ => unreachable!("subcommand_required is set"),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn arg<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .unwrap_or_default()
}

fn provider_id(matches: &ArgMatches, env: &Environment, setting: &str, default: &str) -> String {
    let id = matches
        .get_one::<String>("provider")
        .cloned()
        .or_else(|| env.get(setting))
        .unwrap_or_else(|| default.to_string());
    debug!(%id, setting, "Selected provider");
    id
}

fn parse_tags(matches: &ArgMatches) -> anyhow::Result<HashMap<String, String>> {
    let mut tags = HashMap::new();
    for raw in matches.get_many::<String>("tag").into_iter().flatten() {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("invalid tag '{raw}', expected KEY=VALUE");
        };
        tags.insert(key.to_string(), value.to_string());
    }
    Ok(tags)
}

async fn run_secret(matches: &ArgMatches, env: &Environment) -> anyhow::Result<()> {
    let id = provider_id(matches, env, SECRETS_PROVIDER, GOOGLE_SECRETS_MANAGER);
    let provider = create_secrets_provider(&default_secret_providers(), &id, env).await?;

    match matches.subcommand() {
        Some(("get", m)) => {
            let key = arg(m, "key");
            match provider.get_secret(key).await? {
                Some(value) => println!("{}", value.expose_secret()),
                None => bail!("secret '{key}' not found"),
            }
        }
        Some(("put", m)) => {
            provider.save_secret(arg(m, "key"), arg(m, "value")).await?;
        }
        Some(("delete", m)) => {
            provider.delete_secret(arg(m, "key")).await?;
        }
        _ => unreachable!("subcommand_required is set"),
    }
    Ok(())
}

async fn run_env(matches: &ArgMatches, env: &Environment) -> anyhow::Result<()> {
    let id = provider_id(matches, env, SECRETS_PROVIDER, GOOGLE_SECRETS_MANAGER);
    let service = create_environment_service(&default_environment_providers(), &id, env).await?;

    match matches.subcommand() {
        Some(("get", m)) => {
            let value = service.get(arg(m, "name")).await?;
            println!("{}", value.expose_secret());
        }
        Some(("load", m)) => {
            let file = arg(m, "file");
            let items = dotenvy::from_path_iter(Path::new(file))
                .with_context(|| format!("failed to open {file}"))?
                .collect::<Result<HashMap<String, String>, _>>()
                .with_context(|| format!("failed to parse {file}"))?;

            service.save_all(&items).await?;
            println!("Saved {} values", items.len());
        }
        _ => unreachable!("subcommand_required is set"),
    }
    Ok(())
}

async fn open_manager(
    matches: &ArgMatches,
    env: &Environment,
) -> anyhow::Result<std::sync::Arc<dyn ObjectStorageManager>> {
    let id = provider_id(matches, env, STORAGE_PROVIDER, GOOGLE_CLOUD_STORAGE);
    Ok(create_object_storage(&default_object_storage_providers(), &id, env).await?)
}

async fn open_bucket(
    manager: &dyn ObjectStorageManager,
    name: &str,
) -> anyhow::Result<Box<dyn ObjectStorage>> {
    manager
        .get(name)
        .await?
        .with_context(|| format!("bucket '{name}' does not exist"))
}

async fn run_bucket(matches: &ArgMatches, env: &Environment) -> anyhow::Result<()> {
    let manager = open_manager(matches, env).await?;

    match matches.subcommand() {
        Some(("list", _)) => {
            for area in manager.list().await? {
                println!("{}", area.name);
            }
        }
        Some(("info", m)) => {
            let name = arg(m, "name");
            let area = manager
                .get_item(name)
                .await?
                .with_context(|| format!("bucket '{name}' does not exist"))?;

            println!("{}", area.name);
            let mut tags: Vec<_> = area.tags.into_iter().collect();
            tags.sort();
            for (key, value) in tags {
                println!("  {key}={value}");
            }
        }
        Some(("create", m)) => {
            let name = arg(m, "name");
            manager
                .create(name, m.get_flag("public"), &parse_tags(m)?)
                .await?;
            println!("Created bucket {name}");
        }
        Some(("delete", m)) => {
            manager.delete(arg(m, "name")).await?;
        }
        _ => unreachable!("subcommand_required is set"),
    }
    Ok(())
}

async fn run_object(matches: &ArgMatches, env: &Environment) -> anyhow::Result<()> {
    let manager = open_manager(matches, env).await?;

    match matches.subcommand() {
        Some(("put", m)) => {
            let bucket = open_bucket(manager.as_ref(), arg(m, "bucket")).await?;
            let file = arg(m, "file");
            let data = tokio::fs::read(file)
                .await
                .with_context(|| format!("failed to read {file}"))?;

            bucket
                .upload(arg(m, "key"), Bytes::from(data), &parse_tags(m)?)
                .await?;
        }
        Some(("get", m)) => {
            let bucket = open_bucket(manager.as_ref(), arg(m, "bucket")).await?;
            let data = bucket.download(arg(m, "key")).await?;

            match m.get_one::<String>("file") {
                Some(file) => tokio::fs::write(file, &data)
                    .await
                    .with_context(|| format!("failed to write {file}"))?,
                None => std::io::stdout().write_all(&data)?,
            }
        }
        Some(("ls", m)) => {
            let bucket = open_bucket(manager.as_ref(), arg(m, "bucket")).await?;
            let (objects, prefixes) = bucket.list(arg(m, "prefix")).await?;

            for prefix in prefixes {
                println!("{}", prefix.key);
            }
            for object in objects {
                println!("{}\t{}", object.size, object.key);
            }
        }
        Some(("rm", m)) => {
            let bucket = open_bucket(manager.as_ref(), arg(m, "bucket")).await?;
            bucket.delete(arg(m, "key")).await?;
        }
        _ => unreachable!("subcommand_required is set"),
    }
    Ok(())
}
