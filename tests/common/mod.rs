#![allow(dead_code)]

pub mod requests {
    use bindery::Context;
    use http::{Method, Request};
    use smallvec::smallvec;
    use std::sync::Arc;

    /// Builds a request with optional headers and body.
    pub fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: &str) -> Request<Vec<u8>> {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(body.as_bytes().to_vec()).unwrap()
    }

    pub fn get(uri: &str) -> Request<Vec<u8>> {
        request(Method::GET, uri, &[], "")
    }

    /// Context for `uri` with the given captured path parameters.
    pub fn context(uri: &str, path_params: &[(&str, &str)]) -> Context {
        let mut ctx = Context::new(get(uri));
        let mut params: bindery::router::ParamVec = smallvec![];
        for (name, value) in path_params {
            params.push((Arc::from(*name), value.to_string()));
        }
        ctx.set_path_params(params);
        ctx
    }

    pub fn json_body(ctx: &Context) -> serde_json::Value {
        serde_json::from_slice(ctx.response_body()).unwrap()
    }
}
