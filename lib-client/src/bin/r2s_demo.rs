use std::path::PathBuf;

use alloy::primitives::U256;
use r2s_client::{logging, to_base_units, CreateCampaignParams, Sdk, SdkConfig};
use tracing::info;

const ENV_PRIVATE_KEY: &str = "R2S_PRIVATE_KEY";

fn main() -> anyhow::Result<()> {
    // Usage:
    //   r2s_demo [--config r2s.toml] [--create]
    //
    // Notes:
    // - The signing key comes from R2S_PRIVATE_KEY and is never printed.
    // - Without a key only the read-only summary runs.

    let mut config_path: Option<PathBuf> = None;
    let mut create = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let v = args
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a value"))?;
                config_path = Some(PathBuf::from(v));
            }
            "--create" => create = true,
            other => anyhow::bail!("unknown argument: {}", other),
        }
    }

    logging::init();

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(config_path, create))
}

async fn run(config_path: Option<PathBuf>, create: bool) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => SdkConfig::load(&path)?,
        None => {
            let mut config = SdkConfig::default();
            config.apply_env_overrides()?;
            config
        }
    };

    let key = std::env::var(ENV_PRIVATE_KEY).ok();
    let sdk = Sdk::connect(config, key.as_deref()).await?;
    let reader = sdk.reader();

    let token = reader.token().token_info().await?;
    println!("Token:      {} ({})", token.name, token.symbol);
    println!("Decimals:   {}", token.decimals);
    println!("Supply:     {}", token.total_supply);
    println!("Block:      {}", reader.block_number().await?);
    println!("Campaigns:  {}", reader.campaign().next_campaign_id().await?);

    let fees = reader.campaign().fees().await?;
    println!(
        "Fees (bps): platform {}, merchant {}, early withdraw {}",
        fees.platform_fee, fees.merchant_fee, fees.early_withdraw_penalty
    );

    let Some(signer) = sdk.signer() else {
        if create {
            anyhow::bail!("--create needs {}", ENV_PRIVATE_KEY);
        }
        return Ok(());
    };

    let account = signer.account();
    let balance = signer.reader().balance_of(account).await?;
    println!("Account:    {} holds {}", account, balance);

    if !create {
        return Ok(());
    }

    let params = CreateCampaignParams::builder("Demo Campaign")
        .description("Created by r2s_demo")
        .target_amount(to_base_units("10000", token.decimals)?)
        .deposit_bounds(
            to_base_units("100", token.decimals)?,
            to_base_units("1000", token.decimals)?,
        )
        .discount_rate(1_000)
        .duration(30 * 24 * 60 * 60)
        .settlement_period(7 * 24 * 60 * 60)
        .build();

    let id = signer.campaign().create_campaign(params).await?;
    info!("Campaign {} created", id);

    let campaign = signer.reader().get_campaign(id).await?;
    let now = signer.campaign().reader().now().await?;
    println!("Created:    #{} \"{}\"", campaign.id, campaign.title);
    println!(
        "Window:     {} .. {} (status {})",
        campaign.start_time,
        campaign.end_time,
        campaign.status_at(now)
    );
    println!("Raised:     {} of {}", campaign.current_amount, campaign.target_amount);

    if campaign.current_amount != U256::ZERO {
        anyhow::bail!("fresh campaign {} already holds deposits", id);
    }
    Ok(())
}
