use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use colored::*;
use enhancer_sdk::{
    interface::Address,
    metadata::{latest_note_properties, resolve_template_cid},
    AssetCache, AssetRecord, AssetStandard, BatchPlan, LedgerClient, Operation,
    TransactionFactory,
};

use crate::{Command, EnhancerCliContext, OperationKind};

pub async fn run_command_mode(ctx: &mut EnhancerCliContext, cmd: Command) -> Result<()> {
    match cmd {
        Command::Account { address } => {
            let address = parse_address(&address)?;
            let account = ctx.ledger.account(&address).await?;

            println!("{}", "Account".bright_blue().bold());
            println!("  Address: {}", address.to_string().cyan());
            println!("  Balance: {} microAlgos", account.amount);
            println!("  Min balance: {} microAlgos", account.min_balance);
            println!("  Assets opted in: {}", account.total_assets_opted_in);
            println!("  Assets created: {}", account.total_created_assets);
            Ok(())
        },
        Command::Assets { address } => {
            let address = parse_address(&address)?;
            let assets = ctx.ledger.account_assets(&address).await?;

            println!(
                "{} ({})",
                "Held assets".bright_blue().bold(),
                assets.len()
            );
            for asset in assets {
                println!(
                    "  {:>12}  amount {:<20} opted in at round {}",
                    asset.asset_id.to_string().yellow(),
                    asset.amount,
                    asset.opted_in_at_round
                );
            }
            Ok(())
        },
        Command::Created { address } => {
            let address = parse_address(&address)?;
            let assets = ctx.ledger.created_assets(&address).await?;

            println!(
                "{} ({})",
                "Created assets".bright_blue().bold(),
                assets.len()
            );
            for asset in &assets {
                println!(
                    "  {:>12}  {:<8} {}",
                    asset.id.to_string().yellow(),
                    AssetStandard::classify(&asset.url).label(),
                    asset.name
                );
            }
            Ok(())
        },
        Command::Asset { id } => {
            let asset = ctx.ledger.asset(id).await?;
            print_asset(ctx, &asset);
            Ok(())
        },
        Command::Metadata { id } => {
            let asset = ctx.ledger.asset(id).await?;
            match AssetStandard::classify(&asset.url) {
                AssetStandard::Arc19 => {
                    let cid = resolve_template_cid(&asset.url, &asset.reserve)?;
                    println!("{} {}", "ARC19 content id:".bright_blue().bold(), cid.green());
                },
                AssetStandard::Arc69 => {
                    let transactions = ctx.ledger.asset_config_transactions(id).await?;
                    let properties = latest_note_properties(&transactions)?;
                    println!("{}", "ARC69 properties".bright_blue().bold());
                    if properties.is_empty() {
                        println!("  (none)");
                    }
                    for (key, value) in properties {
                        println!("  {}: {}", key.cyan(), value);
                    }
                },
                AssetStandard::Arc3 => {
                    println!("{} {}", "ARC3 metadata:".bright_blue().bold(), asset.url);
                },
                AssetStandard::Unknown => {
                    println!("{}", "Asset has no IPFS-hosted metadata".yellow());
                },
            }
            Ok(())
        },
        Command::Classify { url } => {
            println!("{}", AssetStandard::classify(&url).label());
            Ok(())
        },
        Command::Prepare {
            operation,
            assets,
            from,
            receiver,
            amount,
        } => {
            let signer = match from {
                Some(from) => Some(parse_address(&from)?),
                None => ctx.config.wallet.wallet_address,
            };
            let operation = build_operation(operation, receiver, amount)?;

            let mut cache = AssetCache::new();
            let factory = TransactionFactory::new(&ctx.ledger);
            let plan = factory
                .build(&mut cache, &operation, &assets, signer)
                .await?;
            print_plan(&operation, &plan)
        },
        Command::Config { wallet } => {
            if let Some(wallet) = wallet {
                let address = parse_address(&wallet)?;
                if !ctx.config.wallet.contains(&address) {
                    ctx.config.wallet.accounts.push(address);
                }
                ctx.config.wallet.wallet_address = Some(address);
            }
            ctx.config.save(&ctx.config_dir)?;

            println!("{}", "Configuration saved".green().bold());
            println!("  Directory: {}", ctx.config_dir.display());
            println!("{}", serde_json::to_string_pretty(&ctx.config)?);
            Ok(())
        },
    }
}

fn parse_address(text: &str) -> Result<Address> {
    text.trim()
        .parse()
        .map_err(|e| anyhow!("Invalid address {}: {}", text, e))
}

fn build_operation(
    kind: OperationKind,
    receiver: Option<String>,
    amount: Option<String>,
) -> Result<Operation> {
    let transfer_args = || -> Result<(String, Address)> {
        let receiver = receiver
            .as_deref()
            .ok_or_else(|| anyhow!("--receiver is required"))?;
        let amount = amount.clone().ok_or_else(|| anyhow!("--amount is required"))?;
        Ok((amount, parse_address(receiver)?))
    };

    Ok(match kind {
        OperationKind::OptIn => Operation::OptIn,
        OperationKind::OptOut => Operation::OptOut,
        OperationKind::Destroy => Operation::Destroy,
        OperationKind::Send => {
            let (amount, receiver) = transfer_args()?;
            Operation::Send { amount, receiver }
        },
        OperationKind::Transfer => {
            let (amount, receiver) = transfer_args()?;
            Operation::Transfer { amount, receiver }
        },
    })
}

fn print_asset(ctx: &EnhancerCliContext, asset: &AssetRecord) {
    let standard = AssetStandard::classify(&asset.url);
    let network = ctx.config.network;
    let explorer = if asset.total_supply == 1 && asset.decimals == 0 {
        network.asset_explorer_url(asset.id)
    } else {
        network.token_explorer_url(asset.id)
    };

    println!("{}", "Asset".bright_blue().bold());
    println!("  ID: {}", asset.id.to_string().yellow());
    println!("  Name: {} ({})", asset.name, asset.unit_name);
    println!("  Creator: {}", asset.creator);
    println!("  Manager: {}", asset.manager);
    println!("  Decimals: {}", asset.decimals);
    println!("  Total supply: {}", asset.total_supply);
    println!("  URL: {}", asset.url);
    println!("  Standard: {}", standard.label());
    if asset.deleted {
        println!("  {}", "Deleted".red().bold());
    }
    println!("  Explorer: {}", explorer.cyan());
}

fn print_plan(operation: &Operation, plan: &BatchPlan) -> Result<()> {
    println!(
        "{} {} ({} groups)",
        "Prepared".green().bold(),
        operation.name(),
        plan.units.len()
    );

    for unit in &plan.units {
        let group_id = unit
            .group
            .group_id()
            .map(|id| STANDARD.encode(id))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "\n  Asset {}  group {}",
            unit.asset_id.to_string().yellow(),
            group_id
        );
        for (txn, encoded) in unit.group.transactions().iter().zip(unit.group.encode()?) {
            println!("    {} {}", txn.id()?.cyan(), STANDARD.encode(encoded));
        }
    }

    for skipped in &plan.skipped {
        println!(
            "  {} {}: {}",
            "Skipped".yellow().bold(),
            skipped.asset_id,
            skipped.reason
        );
    }
    Ok(())
}
