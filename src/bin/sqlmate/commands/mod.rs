use sqlmate::api::{ApiClient, HttpTransport};
use sqlmate::cache::{CacheDir, Cacheable, SharedCacheKey};
use sqlmate::config::Config;
use sqlmate::session::{Session, SessionKey};
use sqlmate::studio::canvas::Canvas;
use sqlmate::studio::console::{Console, ConsoleOutput};
use sqlmate::studio::structure::SchemaCatalog;
use sqlmate::{config, Action, Error};
use std::future::Future;
use tokio::runtime::Builder;

pub mod auth;
pub mod canvas;
pub mod query;
pub mod tables;

type Client = ApiClient<HttpTransport>;

/// Everything a command needs, read from the config and the cache.
pub struct Studio {
    pub config: Config,
    cache: CacheDir,
}

impl Studio {
    pub fn open() -> Result<Studio, Error> {
        Ok(Studio {
            config: config::read()?,
            cache: CacheDir::default_location()?,
        })
    }

    pub fn session(&self) -> Result<Session, Error> {
        let key = SessionKey::for_server(&self.config.api_url);
        let session: Option<Session> = self.cache.read_optional(&key)?;

        Ok(session.unwrap_or_else(|| Session::anonymous(&self.config.api_url)))
    }

    pub fn save_session(&self, session: &Session) -> Result<(), Error> {
        self.cache.write(session)
    }

    pub fn client(&self) -> Result<Client, Error> {
        Ok(ApiClient::new(
            HttpTransport::new(&self.config.api_url),
            self.session()?,
        ))
    }

    /// Stores whatever happened to the session during the call, a rejected token included,
    /// then hands back the call's result.
    pub fn keep_session<R>(&self, client: Client, result: Result<R, Error>) -> Result<R, Error> {
        self.save_session(&client.into_session())?;

        result
    }

    pub fn catalog(&self) -> Result<SchemaCatalog, Error> {
        SchemaCatalog::load(&self.config.schema_path)
    }

    pub fn canvas(&self) -> Result<Canvas, Error> {
        let canvas: Option<Canvas> = self
            .cache
            .read_optional(&SharedCacheKey::new(Canvas::type_id()))?;

        Ok(canvas.unwrap_or_default())
    }

    pub fn save_canvas(&self, canvas: &Canvas) -> Result<(), Error> {
        self.cache.write(canvas)
    }

    pub fn console(&self) -> Result<Console, Error> {
        let output: Option<ConsoleOutput> = self
            .cache
            .read_optional(&SharedCacheKey::new(ConsoleOutput::type_id()))?;

        Ok(output.map(Console::restore).unwrap_or_default())
    }

    pub fn save_console(&self, console: &Console) -> Result<(), Error> {
        match console.output() {
            Some(output) => self.cache.write(output),
            None => Ok(()),
        }
    }
}

/// Each command talks to the server at most once, a current thread runtime is plenty.
pub fn block_on<F, T>(future: F) -> Result<T, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    let tokio = Builder::new_current_thread().enable_io().enable_time().build()?;

    tokio.block_on(future)
}

/// Runs one request under its action's in-flight flag. `None` means the result came back after
/// it was given up on.
pub fn perform<F, T>(console: &mut Console, action: Action, request: F) -> Result<Option<T>, Error>
where
    F: Future<Output = Result<T, Error>>,
{
    block_on(console.perform(action, request))
}
