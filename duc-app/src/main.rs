use std::path::PathBuf;

use duc_config::{AppConfig, ConfigError};
use duc_core::scope::Scope;
use duc_restore::{RestoreOptions, SequentialIndexer, restore_document};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

mod loader;
mod summary;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut config_override: Option<PathBuf> = None;
    let mut input_override: Option<PathBuf> = None;
    let mut disable_repair = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.next() else {
                    eprintln!("`--config` 需要提供配置文件路径");
                    std::process::exit(1);
                };
                config_override = Some(PathBuf::from(path));
            }
            "--input" => {
                let Some(path) = args.next() else {
                    eprintln!("`--input` 需要提供文档路径");
                    std::process::exit(1);
                };
                input_override = Some(PathBuf::from(path));
            }
            "--no-repair" => disable_repair = true,
            other => {
                eprintln!("未知参数：{other}");
                std::process::exit(1);
            }
        }
    }

    let config = load_configuration(config_override);
    init_logging(&config);
    info!("启动 duc 文档恢复演示");

    let loaded = match input_override {
        Some(path) => match loader::load_document(&path) {
            Ok(loaded) => loaded,
            Err(err) => {
                error!(error = %err, "无法加载输入文档");
                std::process::exit(1);
            }
        },
        None => loader::load_document_from_env_or_demo(),
    };

    let indexer = SequentialIndexer;
    let options = RestoreOptions {
        index_synchronizer: &indexer,
        refresh_dimensions: config.restore.refresh_dimensions,
        repair_bindings: config.restore.repair_bindings && !disable_repair,
        pass_through_element_ids: None,
        force_scope: resolve_force_scope(&config),
    };
    let restored = restore_document(loaded.raw, &options);
    summary::print_summary(&loaded.source, &restored);
}

fn load_configuration(override_path: Option<PathBuf>) -> AppConfig {
    match override_path {
        Some(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "加载指定配置失败，使用默认配置");
            AppConfig::default()
        }),
        None => match AppConfig::discover() {
            Ok(cfg) => cfg,
            Err(err) => {
                match &err {
                    ConfigError::Io { path, .. } | ConfigError::Parse { path, .. } => {
                        warn!(path = %path.display(), error = %err, "加载默认配置失败，使用内建默认值");
                    }
                    ConfigError::Context { .. } => {
                        warn!(error = %err, "加载默认配置失败，使用内建默认值");
                    }
                }
                AppConfig::default()
            }
        },
    }
}

/// 配置里的强制尺度以文本存放，未知文本按未设置处理。
fn resolve_force_scope(config: &AppConfig) -> Option<Scope> {
    let text = config.restore.force_scope.as_deref()?;
    match text.parse::<Scope>() {
        Ok(scope) => Some(scope),
        Err(_) => {
            warn!(scope = text, "配置中的强制尺度无法识别，忽略");
            None
        }
    }
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_new(config.logging.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter);
    if subscriber.try_init().is_err() {
        // 已初始化，忽略
    }
}
