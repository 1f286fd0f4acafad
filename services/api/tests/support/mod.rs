//! In-memory stand-ins for the API's ports and helpers for driving the router

#![allow(dead_code)]

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use api::{
    AppState, create_router,
    models::{NewUser, User, Video},
    repositories::{UserRepository, VideoRepository},
};
use async_trait::async_trait;
use auth::{
    JwtConfig, JwtService, Notifier,
    notifier::{NotifyError, OutgoingEmail},
};
use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use common::{
    error::{DatabaseError, DatabaseResult, StorageError, StorageResult},
    storage::ObjectStorage,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "clipshare-test-boundary";

fn unavailable() -> DatabaseError {
    DatabaseError::Query(sqlx::Error::PoolTimedOut)
}

#[derive(Default)]
pub struct FakeUsers {
    pub users: Mutex<Vec<User>>,
    /// (user, video) links in insertion order
    pub links: Mutex<Vec<(Uuid, Uuid)>>,
    pub videos: Mutex<Vec<Video>>,
    pub fail_append: AtomicBool,
}

impl FakeUsers {
    pub fn snapshot(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    pub fn link_count(&self) -> usize {
        self.links.lock().unwrap().len()
    }

    fn update<F: FnOnce(&mut User)>(&self, id: Uuid, f: F) -> bool {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                f(user);
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserRepository for FakeUsers {
    async fn create(&self, new_user: &NewUser) -> DatabaseResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(DatabaseError::Conflict("users_email_key".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            firstname: new_user.firstname.clone(),
            lastname: new_user.lastname.clone(),
            email: new_user.email.clone(),
            mobile: new_user.mobile.clone(),
            password_hash: new_user.password_hash.clone(),
            bio: None,
            profile_picture: None,
            email_registered: false,
            created_at: now,
            updated_at: now,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> DatabaseResult<Option<User>> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_firstname(&self, firstname: &str) -> DatabaseResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.firstname == firstname)
            .cloned())
    }

    async fn list(&self) -> DatabaseResult<Vec<User>> {
        Ok(self.snapshot())
    }

    async fn mark_logged_in(&self, id: Uuid) -> DatabaseResult<()> {
        self.update(id, |u| u.email_registered = true);
        Ok(())
    }

    async fn update_bio(&self, id: Uuid, bio: Option<&str>) -> DatabaseResult<bool> {
        Ok(self.update(id, |u| u.bio = bio.map(str::to_string)))
    }

    async fn update_profile_picture(&self, id: Uuid, url: &str) -> DatabaseResult<bool> {
        Ok(self.update(id, |u| u.profile_picture = Some(url.to_string())))
    }

    async fn append_video(&self, user_id: Uuid, video_id: Uuid) -> DatabaseResult<bool> {
        if self.fail_append.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        if self.get(user_id).is_none() {
            return Ok(false);
        }
        self.links.lock().unwrap().push((user_id, video_id));
        Ok(true)
    }

    async fn videos_of(&self, user_id: Uuid) -> DatabaseResult<Vec<Video>> {
        let videos = self.videos.lock().unwrap();
        Ok(self
            .links
            .lock()
            .unwrap()
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .filter_map(|(_, video_id)| videos.iter().find(|v| v.id == *video_id).cloned())
            .collect())
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}

/// Video records share the user fake's table so profiles can resolve them
pub struct FakeVideos {
    users: Arc<FakeUsers>,
    pub deleted: Mutex<Vec<Uuid>>,
}

#[async_trait]
impl VideoRepository for FakeVideos {
    async fn create(&self, video: &Video) -> DatabaseResult<()> {
        self.users.videos.lock().unwrap().push(video.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut videos = self.users.videos.lock().unwrap();
        let before = videos.len();
        videos.retain(|v| v.id != id);
        self.deleted.lock().unwrap().push(id);
        Ok(videos.len() < before)
    }
}

#[derive(Default)]
pub struct FakeStorage {
    /// (key, content type, size) of every successful put
    pub puts: Mutex<Vec<(String, String, usize)>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_puts: AtomicBool,
}

impl FakeStorage {
    pub fn put_keys(&self) -> Vec<String> {
        self.puts.lock().unwrap().iter().map(|(k, _, _)| k.clone()).collect()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> StorageResult<String> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(StorageError::Upload {
                key: key.to_string(),
                message: "bucket unavailable".to_string(),
            });
        }
        self.puts
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string(), body.len()));
        Ok(format!("https://clips.s3.us-east-1.amazonaws.com/{key}"))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.deletes.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    /// The password mailed to `email` by the most recent registration
    pub fn password_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let mail = sent.iter().rev().find(|m| m.to == email)?;
        mail.text
            .lines()
            .find_map(|line| line.strip_prefix("Your temporary password is: "))
            .map(|p| p.trim().to_string())
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                email: email.to.clone(),
                reason: "invalid-sender".to_string(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// A router wired to fakes, with handles on each fake for assertions
pub struct TestApp {
    pub router: Router,
    pub users: Arc<FakeUsers>,
    pub videos: Arc<FakeVideos>,
    pub storage: Arc<FakeStorage>,
    pub notifier: Arc<RecordingNotifier>,
    pub jwt_service: JwtService,
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(FakeUsers::default());
        let videos = Arc::new(FakeVideos {
            users: users.clone(),
            deleted: Mutex::new(Vec::new()),
        });
        let storage = Arc::new(FakeStorage::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let jwt_service = JwtService::new(&JwtConfig {
            secret: JWT_SECRET.to_string(),
            token_expiry: 7200,
        });

        let state = AppState {
            user_repository: users.clone(),
            video_repository: videos.clone(),
            storage: storage.clone(),
            notifier: notifier.clone(),
            jwt_service: jwt_service.clone(),
            login_url: "http://localhost:5173/login".to_string(),
        };

        TestApp {
            router: create_router(state),
            users,
            videos,
            storage,
            notifier,
            jwt_service,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(json_request("POST", uri, None, body)).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    /// Register an account and return its id and the mailed password
    pub async fn register(&self, firstname: &str, email: &str) -> (Uuid, String) {
        let (status, _) = self
            .post_json(
                "/api/users/register",
                serde_json::json!({
                    "firstname": firstname,
                    "lastname": "Lee",
                    "email": email,
                    "mobile": "5551234567",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let user = self
            .users
            .snapshot()
            .into_iter()
            .find(|u| u.email == email)
            .unwrap();
        let password = self.notifier.password_for(email).unwrap();
        (user.id, password)
    }

    /// Register an account and return its id and a fresh session token
    pub async fn signed_in(&self, firstname: &str, email: &str) -> (Uuid, String) {
        let (id, _) = self.register(firstname, email).await;
        let token = self.jwt_service.issue(id, firstname, email).unwrap();
        (id, token)
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// One part of a hand-built multipart/form-data body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        file_name: &'a str,
        content_type: &'a str,
        data: Vec<u8>,
    },
}

/// A request with an arbitrary body and content type
pub fn raw_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    content_type: &str,
    body: &str,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn multipart_request(uri: &str, token: Option<&str>, parts: Vec<Part<'_>>) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                file_name,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(&data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn file<'a>(name: &'a str, file_name: &'a str, content_type: &'a str, size: usize) -> Part<'a> {
    Part::File {
        name,
        file_name,
        content_type,
        data: vec![0x42; size],
    }
}
