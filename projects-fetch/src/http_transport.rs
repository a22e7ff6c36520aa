//! Reqwest-based transport for the projects REST API.

use std::num::NonZeroU32;

use reqwest::{Method, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Dashboard, ProjectDetail, ProjectDraft, ProjectId, ProjectSummary, RecordMutations,
    RecordPage, RecordTransport, TransportError, TransportOptions, transport::ListResponse,
};

/// Talks to the projects backend over HTTP.
///
/// | operation | request |
/// |---|---|
/// | list | `GET /projects/?page={n}&page_size={s}` |
/// | get | `GET /projects/{id}/` |
/// | create | `POST /projects/` |
/// | update | `PUT /projects/{id}/` |
/// | delete | `DELETE /projects/{id}/` |
/// | [`Self::list_all`] | `GET /api/projects/all/` |
/// | [`Self::list_by_country`] | `GET /api/projects/country/{name}/` |
/// | [`Self::list_by_approval_status`] | `GET /api/projects/approval-status/{name}/` |
/// | [`Self::dashboard`] | `GET /api/dashboard/` |
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a new `HttpTransport` from the given options.
    #[must_use]
    pub fn new(options: &TransportOptions) -> Self {
        let client = match reqwest::Client::builder().timeout(options.timeout()).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    timeout = ?options.timeout(),
                    "could not build the http client, falling back to a default client without a timeout"
                );
                reqwest::Client::default()
            }
        };
        Self::from_client(client, options.base_url())
    }

    /// Create an `HttpTransport` from an existing [`reqwest::Client`].
    #[must_use]
    pub fn from_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The base url requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Every project, unpaginated.
    pub async fn list_all(&self) -> Result<Vec<ProjectSummary>, TransportError> {
        let response: ListResponse<ProjectSummary> = self
            .request(Method::GET, &["api", "projects", "all"], &[], None::<&()>)
            .await?;
        Ok(response.into_items())
    }

    /// All projects in a country, matched case-insensitively by name.
    pub async fn list_by_country(&self, country_name: &str) -> Result<Vec<ProjectSummary>, TransportError> {
        let response: ListResponse<ProjectSummary> = self
            .request(Method::GET, &["api", "projects", "country", country_name], &[], None::<&()>)
            .await?;
        Ok(response.into_items())
    }

    /// All projects with an approval status, matched case-insensitively by name.
    pub async fn list_by_approval_status(
        &self,
        status_name: &str,
    ) -> Result<Vec<ProjectSummary>, TransportError> {
        let response: ListResponse<ProjectSummary> = self
            .request(
                Method::GET,
                &["api", "projects", "approval-status", status_name],
                &[],
                None::<&()>,
            )
            .await?;
        Ok(response.into_items())
    }

    /// The pre-aggregated dashboard groups.
    pub async fn dashboard(&self) -> Result<Dashboard, TransportError> {
        self.request(Method::GET, &["api", "dashboard"], &[], None::<&()>)
            .await
    }

    /// Build `{base_url}/{segments...}/`, each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let invalid = |message: String| TransportError::Request {
            path: format!("/{}/", segments.join("/")),
            message,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("{} cannot be a base url", self.base_url)))?
            .pop_if_empty()
            .extend(segments)
            // Trailing slash, the backend redirects without it:
            .push("");
        Ok(url)
    }

    async fn send(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<(String, Vec<u8>), TransportError> {
        let url = self.url(segments)?;
        let path = url.path().to_string();

        tracing::debug!(%method, %path, ?query, "sending request");

        let mut builder = self.client.request(method, url);
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| map_reqwest_error(&path, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| map_reqwest_error(&path, e))?;

        if !status.is_success() {
            tracing::warn!(%path, status = status.as_u16(), "request failed");
            return Err(TransportError::Status {
                path,
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok((path, body.to_vec()))
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<&(impl Serialize + Sync)>,
    ) -> Result<T, TransportError> {
        let (path, bytes) = self.send(method, segments, query, body).await?;
        serde_json::from_slice(&bytes).map_err(|source| TransportError::Decode { path, source })
    }
}

/// Map a reqwest error to our [`TransportError`].
fn map_reqwest_error(path: &str, err: reqwest::Error) -> TransportError {
    let message = if err.is_timeout() {
        "timed out".to_string()
    } else {
        err.to_string()
    };
    TransportError::Request {
        path: path.to_string(),
        message,
    }
}

impl RecordTransport for HttpTransport {
    type Record = ProjectSummary;

    async fn list(
        &self,
        page_number: NonZeroU32,
        page_size: NonZeroU32,
    ) -> Result<RecordPage<ProjectSummary>, TransportError> {
        let response: ListResponse<ProjectSummary> = self
            .request(
                Method::GET,
                &["projects"],
                &[
                    ("page", page_number.to_string()),
                    ("page_size", page_size.to_string()),
                ],
                None::<&()>,
            )
            .await?;
        Ok(response.into_page(page_number, page_size))
    }
}

impl RecordMutations for HttpTransport {
    type Id = ProjectId;
    type Draft = ProjectDraft;
    type Detail = ProjectDetail;

    async fn get(&self, id: &ProjectId) -> Result<ProjectDetail, TransportError> {
        let id = id.to_string();
        self.request(Method::GET, &["projects", id.as_str()], &[], None::<&()>)
            .await
    }

    async fn create(&self, draft: &ProjectDraft) -> Result<ProjectDetail, TransportError> {
        self.request(Method::POST, &["projects"], &[], Some(draft))
            .await
    }

    async fn update(&self, id: &ProjectId, draft: &ProjectDraft) -> Result<ProjectDetail, TransportError> {
        let id = id.to_string();
        self.request(Method::PUT, &["projects", id.as_str()], &[], Some(draft))
            .await
    }

    async fn delete(&self, id: &ProjectId) -> Result<(), TransportError> {
        let id = id.to_string();
        self.send(Method::DELETE, &["projects", id.as_str()], &[], None::<&()>)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, sync::Arc};

    use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        routing::get,
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::{LIST_FAILED_MESSAGE, PageRequest, PageSize, PaginatedAccessor};

    /// Every request the test server saw, in order.
    type Seen = Arc<parking_lot::Mutex<Vec<String>>>;

    fn project_json(project_id: i64) -> Value {
        json!({
            "project_id": project_id,
            "project_title": format!("Project {project_id}"),
            "paas_code": null,
            "approval_status": 1,
            "approval_status_name": "Approved",
            "fund": 2,
            "fund_code": "FA",
            "pag_value": "1500.00",
            "start_date": "2024-01-31",
            "end_date": null,
            "country": 3,
            "country_name": "Côte d'Ivoire",
            "lead_org_unit": null,
            "lead_org_unit_name": null,
            "theme": 4,
            "theme_name": "Health",
            "total_expenditure": "10.50",
            "total_contribution": null,
            "total_psc": null
        })
    }

    async fn list_paginated(
        State(seen): State<Seen>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let page = query.get("page").cloned().unwrap_or_default();
        let page_size = query.get("page_size").cloned().unwrap_or_default();
        seen.lock().push(format!("GET page={page} page_size={page_size}"));
        let first: i64 = page.parse().unwrap_or(0);
        Json(json!({
            "count": 23,
            "next": null,
            "previous": null,
            "results": [project_json(first * 100)],
        }))
    }

    async fn detail(State(seen): State<Seen>, Path(id): Path<i64>) -> Json<Value> {
        seen.lock().push(format!("GET {id}"));
        let mut project = project_json(id);
        project["donors"] = json!([{"id": 1, "donor_name": "Sweden"}]);
        Json(project)
    }

    async fn create(State(seen): State<Seen>, Json(draft): Json<Value>) -> (StatusCode, Json<Value>) {
        seen.lock().push(format!("POST {}", draft["pag_value"]));
        let id = draft["project_id"].as_i64().unwrap_or_default();
        (StatusCode::CREATED, Json(project_json(id)))
    }

    async fn replace(
        State(seen): State<Seen>,
        Path(id): Path<i64>,
        Json(draft): Json<Value>,
    ) -> Json<Value> {
        seen.lock().push(format!("PUT {id}"));
        let mut project = project_json(id);
        project["project_title"] = draft["project_title"].clone();
        Json(project)
    }

    async fn remove(State(seen): State<Seen>, Path(id): Path<i64>) -> StatusCode {
        seen.lock().push(format!("DELETE {id}"));
        StatusCode::NO_CONTENT
    }

    fn projects_router(seen: Seen) -> Router {
        Router::new()
            .route("/projects/", get(list_paginated).post(create))
            .route("/projects/{id}/", get(detail).put(replace).delete(remove))
            .with_state(seen)
    }

    async fn serve(router: Router) -> HttpTransport {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        HttpTransport::new(&TransportOptions::new().set_base_url(format!("http://{addr}/")))
    }

    #[tokio::test]
    async fn test_list_paginated_shape() {
        let seen = Seen::default();
        let transport = serve(projects_router(seen.clone())).await;

        let page = transport
            .list(NonZeroU32::new(2).unwrap(), NonZeroU32::new(10).unwrap())
            .await
            .unwrap();
        assert_eq!(page.total_count, 23);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].project_id, 200);
        assert_eq!(page.items[0].country_name, "Côte d'Ivoire");

        // The sentinel only ever reaches the wire as a number:
        let accessor = PaginatedAccessor::new(transport);
        let page = accessor
            .list_page(PageRequest::first(PageSize::All))
            .await
            .unwrap();
        assert_eq!(page.total_pages(), 1);

        assert_eq!(
            *seen.lock(),
            vec!["GET page=2 page_size=10", "GET page=1 page_size=1000"]
        );
    }

    /// A bare array is the whole collection, each page is cut out of it.
    #[tokio::test]
    async fn test_list_bare_shape() {
        let router = Router::new().route(
            "/projects/",
            get(|| async { Json(Value::Array((1..=23).map(project_json).collect())) }),
        );
        let accessor = PaginatedAccessor::new(serve(router).await);

        for (page_number, first_id, len) in [(1, 1, 10), (2, 11, 10), (3, 21, 3)] {
            let page = accessor
                .list_page(PageRequest::new(page_number, PageSize::fixed(10).unwrap()).unwrap())
                .await
                .unwrap();
            assert_eq!(page.items().len(), len);
            assert_eq!(page.items()[0].project_id, first_id);
            assert_eq!(page.total_count(), 23);
            assert_eq!(page.total_pages(), 3);
        }

        let page = accessor
            .list_page(PageRequest::first(PageSize::All))
            .await
            .unwrap();
        assert_eq!(page.items().len(), 23);
        assert_eq!(page.total_pages(), 1);
    }

    #[tokio::test]
    async fn test_error_status() {
        let router = Router::new().route(
            "/projects/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let transport = serve(router).await;
        let err = transport
            .list(NonZeroU32::MIN, NonZeroU32::new(10).unwrap())
            .await
            .unwrap_err();
        match &err {
            TransportError::Status { path, status, body } => {
                assert_eq!(path, "/projects/");
                assert_eq!(*status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.user_message(), LIST_FAILED_MESSAGE);
    }

    #[tokio::test]
    async fn test_invalid_body() {
        let router = Router::new().route("/projects/", get(|| async { "<html>oops</html>" }));
        let transport = serve(router).await;
        let err = transport
            .list(NonZeroU32::MIN, NonZeroU32::new(10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Decode { .. }), "{err:?}");
        assert_eq!(err.path(), "/projects/");
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::from_client(reqwest::Client::new(), format!("http://{addr}"));
        let err = transport
            .list(NonZeroU32::MIN, NonZeroU32::new(10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Request { .. }), "{err:?}");
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_mutations() {
        let seen = Seen::default();
        let transport = serve(projects_router(seen.clone())).await;

        let detail = transport.get(&7).await.unwrap();
        assert_eq!(detail.summary.project_id, 7);
        assert_eq!(detail.donors[0].donor_name, "Sweden");

        let mut draft = ProjectDraft::from(&detail.summary);
        draft.project_id = 8;
        let created = transport.create(&draft).await.unwrap();
        assert_eq!(created.summary.project_id, 8);
        assert!(created.donors.is_empty());

        draft.project_title = "Renamed".to_string();
        let updated = transport.update(&8, &draft).await.unwrap();
        assert_eq!(updated.summary.project_title, "Renamed");

        transport.delete(&8).await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["GET 7", "POST \"1500.00\"", "PUT 8", "DELETE 8"]
        );
    }

    #[tokio::test]
    async fn test_filtered_lists_encode_names() {
        let seen = Seen::default();
        let router = Router::new()
            .route(
                "/api/projects/country/{name}/",
                get(|State(seen): State<Seen>, Path(name): Path<String>| async move {
                    seen.lock().push(format!("country {name}"));
                    Json(json!([project_json(1)]))
                }),
            )
            .route(
                "/api/projects/approval-status/{name}/",
                get(|State(seen): State<Seen>, Path(name): Path<String>| async move {
                    seen.lock().push(format!("status {name}"));
                    Json(json!({"count": 1, "results": [project_json(2)]}))
                }),
            )
            .with_state(seen.clone());
        let transport = serve(router).await;

        let projects = transport.list_by_country("Côte d'Ivoire").await.unwrap();
        assert_eq!(projects[0].project_id, 1);
        let projects = transport
            .list_by_approval_status("Pending / review")
            .await
            .unwrap();
        assert_eq!(projects[0].project_id, 2);

        assert_eq!(
            *seen.lock(),
            vec!["country Côte d'Ivoire", "status Pending / review"]
        );
    }

    #[tokio::test]
    async fn test_list_all_either_shape() {
        let router = Router::new().route(
            "/api/projects/all/",
            get(|| async {
                Json(json!({
                    "count": 12,
                    "results": (1..=12).map(project_json).collect::<Vec<_>>(),
                }))
            }),
        );
        let projects = serve(router).await.list_all().await.unwrap();
        assert_eq!(projects.len(), 12);

        let router = Router::new().route(
            "/api/projects/all/",
            get(|| async { Json(Value::Array((1..=12).map(project_json).collect())) }),
        );
        let projects = serve(router).await.list_all().await.unwrap();
        assert_eq!(projects.len(), 12);
        assert_eq!(projects[11].project_id, 12);
    }

    #[test]
    fn test_new_applies_timeout() {
        let options = TransportOptions::new()
            .set_base_url("http://api.test/")
            .set_timeout(std::time::Duration::from_millis(1500));
        let transport = HttpTransport::new(&options);
        assert_eq!(transport.base_url(), "http://api.test");
    }

    #[tokio::test]
    async fn test_dashboard() {
        let router = Router::new().route(
            "/api/dashboard/",
            get(|| async {
                Json(json!({
                    "by_country": [
                        {"country__country_name": "Kenya", "count": 4, "total_value": "400.00"},
                        {"country__country_name": null, "count": 1, "total_value": null}
                    ],
                    "by_org_unit": [],
                    "by_theme": [{"theme__theme_name": "Health", "count": 5, "total_value": 400.0}]
                }))
            }),
        );
        let dashboard = serve(router).await.dashboard().await.unwrap();
        assert_eq!(dashboard.by_country[1].name, None);
        let summary = dashboard.summary();
        assert_eq!(summary.total_projects, 5);
        assert_eq!(summary.countries, 2);
        assert_eq!(summary.total_value, 400.0);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let transport = HttpTransport::new(&TransportOptions::new().set_base_url("http://api.test/v1/"));
        assert_eq!(transport.base_url(), "http://api.test/v1");
        let url = transport.url(&["projects", "12"]).unwrap();
        assert_eq!(url.as_str(), "http://api.test/v1/projects/12/");
        let url = transport.url(&["api", "projects", "country", "São Tomé"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://api.test/v1/api/projects/country/S%C3%A3o%20Tom%C3%A9/"
        );
    }
}
