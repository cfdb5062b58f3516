//! trolley - command line client for the shopping-list cluster.
//!
//! Usage: `trolley <config.toml> <command> [list-id]`

use std::sync::Arc;

use anyhow::{Context, bail};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use trolley::config::{Config, validation};
use trolley::proto::{ClientRequest, ShoppingList};
use trolley::ring::spawn_membership_refresh;
use trolley::{MembershipRefresh, ResponseAction, RingCoordinator, SocketError, telemetry};

const USAGE: &str = "usage: trolley <config.toml> <ring | locate <list-id> | fetch <list-id> | watch <list-id>>";

enum Command {
    Ring,
    Locate(String),
    Fetch(String),
    Watch(String),
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let name = args.next().context(USAGE)?;
        let mut list_id = || args.next().context(USAGE);
        Ok(match name.as_str() {
            "ring" => Self::Ring,
            "locate" => Self::Locate(list_id()?),
            "fetch" => Self::Fetch(list_id()?),
            "watch" => Self::Watch(list_id()?),
            other => bail!("unknown command '{other}'\n{USAGE}"),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "trolley.toml".to_string());
    let command = Command::parse(args)?;

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    telemetry::init(&config.logging.filter);

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(path = %config_path, error = %e, "invalid configuration");
        }
        bail!("{} configuration error(s) in {config_path}", errors.len());
    }

    let mut coordinator = RingCoordinator::from_config(&config)?;
    if let MembershipRefresh::Updated { tokens, nodes } = coordinator.refresh_membership().await {
        info!(tokens, nodes, "using cluster membership");
    } else {
        warn!("using bootstrap ring built from seeds");
    }

    match command {
        Command::Ring => {
            for (token, node) in coordinator.ring().iter() {
                println!("{token:>20}  {node}");
            }
        }
        Command::Locate(list_id) => {
            let key = coordinator.item_key(&list_id);
            println!("key:        {key} -> {}", coordinator.key_for(&list_id));
            println!("preference: {}", coordinator.preference_list(&list_id).join(", "));
            let socket = coordinator.best_socket_for_list(&list_id).await?;
            println!("connected:  {}", socket.url().unwrap_or("-"));
        }
        Command::Fetch(list_id) => {
            let socket = coordinator.best_socket_for_list(&list_id).await?;
            let list = socket
                .send(ClientRequest::get_shopping_list(&list_id), |response| async move {
                    if !response.ok {
                        return Err(SocketError::Rejected(response.error));
                    }
                    response
                        .as_shopping_list()
                        .cloned()
                        .map(ResponseAction::Done)
                        .ok_or(SocketError::UnexpectedResponse("shopping_list"))
                })
                .await?;
            print_list(&list);
        }
        Command::Watch(list_id) => {
            let socket = coordinator.best_socket_for_list(&list_id).await?;
            let refresh_interval = config.coordinator.refresh_interval();
            let shared = Arc::new(Mutex::new(coordinator));
            let refresher =
                refresh_interval.and_then(|interval| spawn_membership_refresh(Arc::clone(&shared), interval));

            info!(list = %list_id, url = ?socket.url(), "watching list, press Ctrl-C to stop");
            let updates = socket.send(ClientRequest::subscribe(&list_id), |response| async move {
                if !response.ok {
                    return Err(SocketError::Rejected(response.error));
                }
                if let Some(list) = response.as_shopping_list() {
                    print_list(list);
                }
                Ok(ResponseAction::<()>::Continue)
            });

            tokio::select! {
                result = updates => {
                    if let Err(e) = result {
                        warn!(list = %list_id, error = %e, "subscription ended");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, unsubscribing");
                    if let Err(e) = socket.request(ClientRequest::unsubscribe(&list_id)).await {
                        warn!(list = %list_id, error = %e, "unsubscribe failed");
                    }
                }
            }

            if let Some(task) = refresher {
                task.abort();
            }
            shared.lock().await.close();
        }
    }
    Ok(())
}

fn print_list(list: &ShoppingList) {
    println!("{} ({})", list.name, list.id);
    for item in &list.items {
        println!(
            "  [{}/{}] {} ({})",
            item.acquired_quantity, item.total_quantity, item.name, item.id
        );
    }
}
