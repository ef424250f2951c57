use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Request, Response};

pub const CACHE_CONTROL: &str = "no-cache, no-store, must-revalidate, max-age=0";

/// Forbids clients from caching dynamic responses. Browsers otherwise happily
/// show stale workload data after a restart.
pub struct NoCache {
    pub prefixes: Vec<&'static str>,
}

#[rocket::async_trait]
impl Fairing for NoCache {
    fn info(&self) -> Info {
        Info {
            name: "Disable caching of dynamic pages",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, req: &'r Request<'_>, res: &mut Response<'r>) {
        let path = req.uri().path();
        if self.prefixes.iter().any(|p| path.as_str().starts_with(p)) {
            res.set_header(Header::new("Cache-Control", CACHE_CONTROL));
            res.set_header(Header::new("Pragma", "no-cache"));
            res.set_header(Header::new("Expires", "0"));
        }
    }
}
