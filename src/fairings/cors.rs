use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Method, Status};
use rocket::{Request, Response};

const ALLOWED_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Origin, Content-Type, Accept";

/// CORSヘッダを付与するFairing。
/// Djangoの `django-cors-headers` (CorsMiddleware) に相当します。
pub struct Cors {
    allowed_origins: Vec<String>,
}

impl Cors {
    pub fn new(allowed_origins: Vec<String>) -> Self {
        Cors { allowed_origins }
    }

    /// 許可されたオリジンなら、レスポンスに返すオリジン値を返す
    pub fn allow_origin(&self, origin: &str) -> Option<String> {
        if self.allowed_origins.iter().any(|o| o == "*") {
            Some("*".to_string())
        } else if self.allowed_origins.iter().any(|o| o == origin) {
            Some(origin.to_string())
        } else {
            None
        }
    }
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let origin = match request.headers().get_one("Origin") {
            Some(origin) => origin,
            None => return,
        };

        let allowed = match self.allow_origin(origin) {
            Some(allowed) => allowed,
            None => {
                log::debug!("CORS: origin {} is not allowed", origin);
                return;
            }
        };

        if allowed != "*" {
            response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
            response.set_header(Header::new("Vary", "Origin"));
        }
        response.set_header(Header::new("Access-Control-Allow-Origin", allowed));
        response.set_header(Header::new("Access-Control-Allow-Methods", ALLOWED_METHODS));
        response.set_header(Header::new("Access-Control-Allow-Headers", ALLOWED_HEADERS));

        // プリフライトは対応ルートが無くても 204 で返す
        if request.method() == Method::Options {
            response.set_status(Status::NoContent);
        }
    }
}

/// プリフライト (OPTIONS) 用のキャッチオールルート
#[options("/<_..>")]
pub fn preflight() -> Status {
    Status::NoContent
}
