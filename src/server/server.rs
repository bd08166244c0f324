use crate::api::v1::ToastSigner;
use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_openapi::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Backing stores picked by `auth.backend`.
pub struct Stores {
    pub revocations: Arc<dyn RevocationStore>,
    pub principals: Arc<dyn PrincipalStore>,
    pool: Option<Pool<MySql>>,
}

impl Stores {
    pub fn in_memory(principals: Arc<MemoryPrincipalStore>) -> Self {
        Stores {
            revocations: Arc::new(MemoryRevocationStore::new()),
            principals,
            pool: None,
        }
    }

    pub async fn connect(settings: &Settings) -> anyhow::Result<Self> {
        match settings.auth.backend.as_str() {
            "fake" => {
                warn!("fake auth backend: revocations are local to this process");
                let principals = Arc::new(MemoryPrincipalStore::new());
                for user in &settings.auth.fake_users {
                    principals.insert(PrincipalRecord {
                        username: user.username.clone(),
                        password_hash: user.password_hash.clone(),
                        is_active: true,
                    });
                }
                Ok(Self::in_memory(principals))
            }
            "real" => {
                let redis_client = redis::Client::open(settings.redis.url.as_str())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                let pool = Pool::<MySql>::connect(&settings.mysql.dsn).await?;
                Ok(Stores {
                    revocations: Arc::new(RedisRevocationStore::new(
                        redis_manager,
                        settings.redis.prefix.clone(),
                    )),
                    principals: Arc::new(MySqlPrincipalStore::new(pool.clone())),
                    pool: Some(pool),
                })
            }
            other => Err(anyhow::anyhow!("Unknown auth backend: {}", other)),
        }
    }
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub authorizer: Arc<dyn Authorizer>,
    pub toast_signer: Arc<ToastSigner>,
    pub routes: AuthRoutes,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let stores = Stores::connect(settings).await?;
        Self::with_stores(settings, stores)
    }

    /// Everything that can fail at startup fails here, before the listener
    /// is bound.
    pub fn with_stores(settings: &Settings, stores: Stores) -> anyhow::Result<Self> {
        let keys = Arc::new(SigningKeys::load(&settings.auth.jwt_private_key_path)?);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtRs256Codec::new(
            JwtConfig {
                issuer: settings.auth.issuer.clone(),
                audience: settings.auth.audience.clone(),
            },
            keys,
        ));

        let catalog = OpenApiRouteCatalog::load(&settings.routes.api_document_path)?;
        info!(
            path = %settings.routes.api_document_path,
            routes = catalog.len(),
            "route catalog loaded"
        );
        let route_catalog: Arc<dyn RouteCatalog> = Arc::new(catalog);

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            stores.principals,
            credential_hasher,
            token_codec,
            stores.revocations,
            TokenPolicy {
                issuer: settings.auth.issuer.clone(),
                audience: settings.auth.audience.clone(),
                access_ttl_secs: settings.auth.access_token_ttl,
                refresh_ttl_secs: settings.auth.refresh_token_ttl,
                store_timeout: Duration::from_millis(settings.auth.store_timeout_ms),
                revoke_refresh_on_rotate: settings.auth.revoke_refresh_on_rotate,
            },
        ));

        let routes = AuthRoutes {
            home: settings.routes.home.clone(),
            login: settings.routes.login.clone(),
            register: settings.routes.register.clone(),
            logout: settings.routes.logout.clone(),
        };
        let authorizer: Arc<dyn Authorizer> = Arc::new(RealAuthorizer::new(
            auth_service.clone(),
            route_catalog,
            routes.clone(),
        ));

        let toast_signer = Arc::new(ToastSigner::try_new(&settings.toast.secret)?);

        info!(backend = %settings.auth.backend, "server started");

        Ok(Self {
            auth_service,
            authorizer,
            toast_signer,
            routes,
            pool: stores.pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
