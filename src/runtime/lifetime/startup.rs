use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::drive::{DriveStorage, GoogleDrive};
use crate::image_script::{AppsScriptClient, ImageScript};
use crate::services::media::BatchRegistry;
use crate::storage::Storage;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub drive: Arc<dyn DriveStorage>,
    pub script: Arc<dyn ImageScript>,
    pub batches: Arc<BatchRegistry>,
}

async fn fallback_to_moka() -> Option<Arc<dyn ObjectCache>> {
    let constructor = get_object_cache_plugin("moka")?;
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created fallback Moka (in-memory) cache backend");
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create fallback Moka cache: {}", e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到内存缓存
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let config = AppConfig::get();
    let cache_type = &config.cache.cache_type;

    warn!("Attempting to create {} cache backend", cache_type);

    match get_object_cache_plugin(cache_type) {
        Some(constructor) => match constructor().await {
            Ok(cache) => {
                warn!("Successfully created {} cache backend", cache_type);
                return Ok(Arc::from(cache));
            }
            Err(e) => {
                warn!("Failed to create {} cache: {}", cache_type, e);
                if cache_type != "moka"
                    && let Some(cache) = fallback_to_moka().await
                {
                    return Ok(cache);
                }
            }
        },
        None => {
            warn!("Cache backend '{}' not found in registry", cache_type);
            if cache_type != "moka"
                && let Some(cache) = fallback_to_moka().await
            {
                return Ok(cache);
            }
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 准备服务器启动的上下文
/// 包括存储、缓存、Drive 客户端与图片脚本客户端
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let config = AppConfig::get();

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    // 教材与媒体上传都依赖 Drive，凭据缺失时无法提供服务
    let drive: Arc<dyn DriveStorage> = Arc::new(
        GoogleDrive::from_config(&config.drive).expect("Failed to create Google Drive client"),
    );
    warn!("Google Drive client initialized");

    if config.image_script.url.is_empty() {
        warn!("Image script URL is not configured, lesson images will be left empty");
    }
    let script: Arc<dyn ImageScript> = Arc::new(
        AppsScriptClient::from_config(&config.image_script)
            .expect("Failed to create image script client"),
    );

    let batches = Arc::new(BatchRegistry::new(config.upload.batch_retention_secs));

    StartupContext {
        storage,
        cache,
        drive,
        script,
        batches,
    }
}
