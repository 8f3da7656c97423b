use std::process;
use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use solana_copy_trader::{
    chain::{ChainClient, KeypairWallet, RpcChainClient, Wallet},
    config::{AppConfig, WalletSource, CONFIG_PATH},
    dex::{JupiterRouter, SwapRouter},
    BotConfig, CopyStrategy, CopyTradingBot, MonitorConfig, TradeExecutor, WalletMonitor,
};

const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run().await {
        error!("Fatal: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load(CONFIG_PATH)?;

    let chain = RpcChainClient::connect(
        &config.solana,
        config.signature_page_size,
        config.monitor.seen_cache_capacity,
    )
    .await?;
    let chain = Arc::new(chain);
    let strategy = Arc::new(CopyStrategy::new(config.strategy));
    info!(
        "Strategy sizing={:?} min_trade_size={} max_trade_size={} max_slippage={}%",
        strategy.config().sizing,
        strategy.config().min_trade_size,
        strategy.config().max_trade_size,
        strategy.config().max_slippage
    );
    if !strategy.config().trade_delay.is_zero() {
        warn!(
            "strategy.trade_delay_ms is set to {:?} but copies are not delayed",
            strategy.config().trade_delay
        );
    }

    let router: Arc<dyn SwapRouter> = Arc::new(JupiterRouter::new(config.router_url));
    let wallet = match &config.wallet {
        WalletSource::PrivateKey(key) => KeypairWallet::from_private_key(key, router, strategy.slippage_bps())?,
        WalletSource::KeypairFile(path) => KeypairWallet::from_keypair_file(path, router, strategy.slippage_bps())?,
    };

    match chain.balance(&wallet.pubkey()).await {
        Ok(lamports) => info!(
            "Operator wallet {} balance: {:.4} SOL",
            wallet.address(),
            lamports as f64 / LAMPORTS_PER_SOL
        ),
        Err(e) => warn!("Could not fetch operator balance: {}", e),
    }

    let bot = build_bot(chain, Arc::new(wallet), strategy, config.monitor, config.bot);

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let summary = bot.run(shutdown).await;
    info!("Final summary: {:?}", summary);
    Ok(())
}

fn build_bot(
    chain: Arc<RpcChainClient>,
    wallet: Arc<dyn Wallet>,
    strategy: Arc<CopyStrategy>,
    monitor_config: MonitorConfig,
    bot_config: BotConfig,
) -> CopyTradingBot {
    let chain: Arc<dyn ChainClient> = chain;
    let monitor = Arc::new(WalletMonitor::new(Arc::clone(&chain), monitor_config));
    let executor = Arc::new(TradeExecutor::new(chain, wallet, strategy));
    CopyTradingBot::new(monitor, executor, bot_config)
}

async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
                    _ = terminate.recv() => info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("Could not listen for SIGINT: {}", e);
                    return;
                }
                info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for Ctrl-C: {}", e);
            return;
        }
        info!("Received Ctrl-C");
    }

    shutdown.cancel();
}
