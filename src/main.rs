mod api;

#[macro_use] extern crate rocket;
extern crate env_logger;
use std::sync::Arc;
use rocket::{ Build, Request, Rocket, Shutdown, State };
use rocket::http::Status;
use rocket::request::{ self, FromRequest };
use rocket::response::status;
use rocket::response::stream::{ Event, EventStream };
use rocket::serde::json::Json;
use rocket::tokio::select;
use crate::api::models::{
    AuthStatus, CocktailError, FavoritesUpdate, GenericError, SavedCocktail, SavedCocktailFilter, SavedCocktailView,
    SelectionSnapshot, SignInChallenge, SignInRequest, Spirit, User
};
use crate::api::{
    AuthService, CandidateSupplier, ClaimsIdentityProvider, RecipeServiceFactory, ResourceService,
    ResourceServiceFactory, SavedCocktailService, SavedCocktailServiceFactory, SelectionService
};

type ApiResult<T> = Result<Json<T>, status::Custom<Json<GenericError>>>;

fn error_status(error: &CocktailError) -> Status {
    match error {
        CocktailError::InvalidRequest(_) => Status::BadRequest,
        CocktailError::Unauthenticated | CocktailError::SignInFailure => Status::Unauthorized,
        CocktailError::NoCandidatesFound | CocktailError::PoolExhausted(_) => Status::NotFound,
        CocktailError::Timeout => Status::GatewayTimeout,
        CocktailError::NoDataReceived | CocktailError::DecodeFailure(_) => Status::BadGateway,
        CocktailError::SignOutFailure => Status::BadGateway,
        CocktailError::SaveFailure(_) | CocktailError::DeleteFailure(_) => Status::InternalServerError
    }
}

fn views(saved_cocktails: Vec<SavedCocktail>) -> Vec<SavedCocktailView> {
    saved_cocktails.into_iter().map(SavedCocktailView::from).collect()
}

fn error_response(resource_service: &ResourceService, error: CocktailError) -> status::Custom<Json<GenericError>> {
    let message = resource_service.render_error_message(&error);
    status::Custom(error_status(&error), Json(GenericError { message }))
}

/// The signed-in user, resolved from the managed `AuthService`.
struct SignedInUser(User);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SignedInUser {
    type Error = CocktailError;

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let user = match request.rocket().state::<AuthService>() {
            Some(auth_service) => auth_service.current_user().await,
            None => None
        };
        match user {
            Some(user) => request::Outcome::Success(SignedInUser(user)),
            None => request::Outcome::Error((Status::Unauthorized, CocktailError::Unauthenticated))
        }
    }
}

#[get("/spirits")]
fn spirits_get() -> Json<Vec<Spirit>> {
    Json(Spirit::ALL.to_vec())
}

#[get("/cocktail")]
fn cocktail_get(selection_service: &State<SelectionService>) -> Json<SelectionSnapshot> {
    Json(selection_service.snapshot())
}

/// The current snapshot, then one event per published change.
#[get("/cocktail/events")]
fn cocktail_events(selection_service: &State<SelectionService>, mut shutdown: Shutdown) -> EventStream![] {
    let mut receiver = selection_service.subscribe();
    EventStream! {
        loop {
            let snapshot = receiver.borrow_and_update().clone();
            yield Event::json(&snapshot);
            select! {
                changed = receiver.changed() => if changed.is_err() { break; },
                _ = &mut shutdown => break
            }
        }
    }
}

#[post("/cocktail/<spirit>")]
async fn cocktail_post(
    selection_service: &State<SelectionService>,
    resource_service: &State<ResourceService>,
    spirit: Result<Spirit, CocktailError>
) -> ApiResult<SelectionSnapshot> {
    let spirit = spirit.map_err(|error| error_response(resource_service, error))?;
    let outcome = selection_service.fetch_cocktail(spirit).await;
    log::debug!("Fetch for {} finished with {:?}", spirit, outcome);
    Ok(Json(selection_service.snapshot()))
}

#[post("/reset")]
async fn reset_post(selection_service: &State<SelectionService>) -> Json<SelectionSnapshot> {
    selection_service.reset().await;
    Json(selection_service.snapshot())
}

#[get("/auth")]
async fn auth_get(auth_service: &State<AuthService>) -> Json<AuthStatus> {
    Json(auth_service.status().await)
}

#[post("/auth/challenge")]
async fn auth_challenge_post(auth_service: &State<AuthService>) -> Json<SignInChallenge> {
    Json(auth_service.begin_sign_in().await)
}

#[post("/auth/sign_in", data = "<sign_in_request>")]
async fn auth_sign_in_post(
    auth_service: &State<AuthService>,
    resource_service: &State<ResourceService>,
    sign_in_request: Json<SignInRequest>
) -> ApiResult<User> {
    auth_service.complete_sign_in(&sign_in_request.identity_token).await
        .map(Json)
        .map_err(|error| error_response(resource_service, error))
}

#[post("/auth/sign_out")]
async fn auth_sign_out_post(auth_service: &State<AuthService>, resource_service: &State<ResourceService>) -> ApiResult<AuthStatus> {
    auth_service.sign_out().await.map_err(|error| error_response(resource_service, error))?;
    Ok(Json(auth_service.status().await))
}

#[get("/saved?<favorites>&<spirit>")]
async fn saved_get(
    saved_cocktail_service: &State<SavedCocktailService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>,
    favorites: Option<bool>,
    spirit: Option<&str>
) -> ApiResult<Vec<SavedCocktailView>> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    let spirit = spirit
        .map(str::parse::<Spirit>)
        .transpose()
        .map_err(|error| error_response(resource_service, error))?;
    let filter = SavedCocktailFilter { favorites_only: favorites.unwrap_or(false), spirit };
    saved_cocktail_service.find(&user.id, &filter).await
        .map(|saved_cocktails| Json(views(saved_cocktails)))
        .map_err(|error| error_response(resource_service, error))
}

/// The user's full list, then the full list again after every change.
#[get("/saved/events")]
fn saved_events<'r>(
    saved_cocktail_service: &'r State<SavedCocktailService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>,
    mut shutdown: Shutdown
) -> Result<EventStream![Event + 'r], status::Custom<Json<GenericError>>> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    Ok(EventStream! {
        match saved_cocktail_service.subscribe(&user.id).await {
            Ok(mut receiver) => loop {
                let saved_cocktails = receiver.borrow_and_update().clone();
                yield Event::json(&views(saved_cocktails));
                select! {
                    changed = receiver.changed() => if changed.is_err() { break; },
                    _ = &mut shutdown => break
                }
            },
            Err(error) => log::warn!("Couldn't follow saved cocktails of {}: {}", user.id, error)
        }
    })
}

#[post("/saved")]
async fn saved_post(
    saved_cocktail_service: &State<SavedCocktailService>,
    selection_service: &State<SelectionService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>
) -> ApiResult<Vec<SavedCocktailView>> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    let cocktail = selection_service.snapshot().current_cocktail.ok_or_else(|| {
        error_response(resource_service, CocktailError::InvalidRequest(String::from("No cocktail to save")))
    })?;
    saved_cocktail_service.save(&user.id, cocktail).await.map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.list(&user.id).await
        .map(|saved_cocktails| Json(views(saved_cocktails)))
        .map_err(|error| error_response(resource_service, error))
}

#[put("/saved/<id>/favorite")]
async fn saved_favorite_put(
    saved_cocktail_service: &State<SavedCocktailService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>,
    id: &str
) -> ApiResult<SavedCocktailView> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.toggle_favorite(&user.id, id).await
        .map(|saved| Json(SavedCocktailView::from(saved)))
        .map_err(|error| error_response(resource_service, error))
}

#[put("/saved/favorites", data = "<favorites_update>")]
async fn saved_favorites_put(
    saved_cocktail_service: &State<SavedCocktailService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>,
    favorites_update: Json<FavoritesUpdate>
) -> ApiResult<Vec<SavedCocktailView>> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.set_favorites(&user.id, &favorites_update.ids, favorites_update.is_favorite).await
        .map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.list(&user.id).await
        .map(|saved_cocktails| Json(views(saved_cocktails)))
        .map_err(|error| error_response(resource_service, error))
}

#[delete("/saved/<id>")]
async fn saved_delete(
    saved_cocktail_service: &State<SavedCocktailService>,
    resource_service: &State<ResourceService>,
    user: Result<SignedInUser, CocktailError>,
    id: &str
) -> ApiResult<Vec<SavedCocktailView>> {
    let SignedInUser(user) = user.map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.delete(&user.id, id).await.map_err(|error| error_response(resource_service, error))?;
    saved_cocktail_service.list(&user.id).await
        .map(|saved_cocktails| Json(views(saved_cocktails)))
        .map_err(|error| error_response(resource_service, error))
}

fn build_rocket(
    resource_service: ResourceService,
    selection_service: SelectionService,
    saved_cocktail_service: SavedCocktailService,
    auth_service: AuthService
) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![
            spirits_get, cocktail_get, cocktail_events, cocktail_post, reset_post,
            auth_get, auth_challenge_post, auth_sign_in_post, auth_sign_out_post,
            saved_get, saved_events, saved_post, saved_favorite_put, saved_favorites_put, saved_delete
        ])
        .manage(resource_service)
        .manage(selection_service)
        .manage(saved_cocktail_service)
        .manage(auth_service)
}

#[launch]
fn rocket() -> _ {
    env_logger::init();
    let resource_service = ResourceServiceFactory::create()
        .unwrap_or_else(|error| panic!("Couldn't create resource service: {}", error));
    let recipe_service = RecipeServiceFactory::create()
        .unwrap_or_else(|error| panic!("Couldn't create recipe service: {}", error));
    let saved_cocktail_service = SavedCocktailServiceFactory::create()
        .unwrap_or_else(|error| panic!("Couldn't create saved cocktail service: {}", error));
    let selection_service = SelectionService::new(CandidateSupplier::new(Arc::new(recipe_service)), resource_service.clone());
    let auth_service = AuthService::new(Arc::new(ClaimsIdentityProvider {}));
    build_rocket(resource_service, selection_service, saved_cocktail_service, auth_service)
}

#[cfg(test)]
mod tests {
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;
    use crate::api::{ sha256_hex, FakeRecipeSource, FileCocktailStore };
    use super::*;

    const RESOURCES: &str = r#"<resources><string name="unauthenticated_error_message">Please sign in first</string><string name="invalid_request_error_message_template">Invalid request: {{detail}}</string></resources>"#;

    async fn client(directory: &tempfile::TempDir) -> Client {
        let recipe_source = FakeRecipeSource::default()
            .with_filter("Gin", &["Gimlet"])
            .with_detail("Gimlet", &["Gin", "Lime juice"])
            .with_filter("Rum", &["Daiquiri"])
            .with_detail("Daiquiri", &["Light rum", "Lime juice"]);
        let resource_service = ResourceService::from_xml_str(RESOURCES).unwrap();
        let selection_service = SelectionService::new(CandidateSupplier::new(Arc::new(recipe_source)), resource_service.clone());
        let store = FileCocktailStore::new(directory.path().to_path_buf().into_boxed_path());
        let saved_cocktail_service = SavedCocktailService::new(Arc::new(store));
        let auth_service = AuthService::new(Arc::new(ClaimsIdentityProvider {}));
        Client::tracked(build_rocket(resource_service, selection_service, saved_cocktail_service, auth_service)).await.unwrap()
    }

    async fn sign_in(client: &Client) {
        let challenge: serde_json::Value = client.post("/auth/challenge").dispatch().await.into_json().await.unwrap();
        let hashed_nonce = challenge["nonce"].as_str().unwrap().to_string();
        let token = serde_json::json!({ "sub": "user-1", "nonce": hashed_nonce }).to_string();
        let response = client.post("/auth/sign_in")
            .header(ContentType::JSON)
            .body(serde_json::json!({ "identityToken": token }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn fetches_cocktail_for_spirit() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;

        let response = client.post("/cocktail/gin").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let snapshot: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(snapshot["currentDrink"], "Gimlet");
        assert_eq!(snapshot["currentIngredients"], "Gin, Lime juice");
        assert_eq!(snapshot["isLoading"], false);
    }

    #[rocket::async_test]
    async fn rejects_unknown_spirit() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;

        let response = client.post("/cocktail/absinthe").dispatch().await;

        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Invalid request: Unknown spirit \"absinthe\"");
    }

    #[rocket::async_test]
    async fn saved_routes_require_sign_in() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;

        let response = client.get("/saved").dispatch().await;

        assert_eq!(response.status(), Status::Unauthorized);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["message"], "Please sign in first");
    }

    #[rocket::async_test]
    async fn saves_and_favorites_current_cocktail() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        sign_in(&client).await;
        client.post("/cocktail/Gin").dispatch().await;

        let saved: Vec<serde_json::Value> = client.post("/saved").dispatch().await.into_json().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0]["cocktailId"], "Gimlet");
        assert_eq!(saved[0]["mainSpirit"], "Gin");
        assert_eq!(saved[0]["formattedIngredients"], serde_json::json!(["Gin", "Lime juice"]));
        let id = saved[0]["id"].as_str().unwrap().to_string();

        let toggled: serde_json::Value = client.put(format!("/saved/{}/favorite", id)).dispatch().await.into_json().await.unwrap();
        assert_eq!(toggled["isFavorite"], true);

        let remaining: Vec<serde_json::Value> = client.delete(format!("/saved/{}", id)).dispatch().await.into_json().await.unwrap();
        assert!(remaining.is_empty());
    }

    #[rocket::async_test]
    async fn sign_in_rejects_wrong_nonce() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        client.post("/auth/challenge").dispatch().await;
        let token = serde_json::json!({ "sub": "user-1", "nonce": sha256_hex("forged") }).to_string();

        let response = client.post("/auth/sign_in")
            .header(ContentType::JSON)
            .body(serde_json::json!({ "identityToken": token }).to_string())
            .dispatch()
            .await;

        assert_eq!(response.status(), Status::Unauthorized);
    }

    #[rocket::async_test]
    async fn filters_saved_cocktails_and_batch_updates_favorites() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        sign_in(&client).await;
        client.post("/cocktail/gin").dispatch().await;
        client.post("/saved").dispatch().await;
        client.post("/cocktail/rum").dispatch().await;
        let saved: Vec<serde_json::Value> = client.post("/saved").dispatch().await.into_json().await.unwrap();
        assert_eq!(saved.len(), 2);
        let ids: Vec<String> = saved.iter().map(|saved| saved["id"].as_str().unwrap().to_string()).collect();

        let updated: Vec<serde_json::Value> = client.put("/saved/favorites")
            .header(ContentType::JSON)
            .body(serde_json::json!({ "ids": ids, "isFavorite": true }).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(updated.iter().all(|saved| saved["isFavorite"] == true));

        let rum: Vec<serde_json::Value> = client.get("/saved?spirit=rum").dispatch().await.into_json().await.unwrap();
        assert_eq!(rum.len(), 1);
        assert_eq!(rum[0]["cocktailId"], "Daiquiri");

        client.put(format!("/saved/{}/favorite", rum[0]["id"].as_str().unwrap())).dispatch().await;
        let favorites: Vec<serde_json::Value> = client.get("/saved?favorites=true").dispatch().await.into_json().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0]["cocktailId"], "Gimlet");
        let rum_favorites: Vec<serde_json::Value> = client.get("/saved?favorites=true&spirit=rum").dispatch().await.into_json().await.unwrap();
        assert!(rum_favorites.is_empty());

        let response = client.get("/saved?spirit=absinthe").dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn streams_selection_snapshots() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        client.post("/cocktail/gin").dispatch().await;

        let response = client.get("/cocktail/events").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        client.rocket().shutdown().notify();

        let body = response.into_string().await.unwrap();
        assert!(body.contains("\"currentDrink\":\"Gimlet\""), "{}", body);
    }

    #[rocket::async_test]
    async fn streams_saved_cocktails_of_signed_in_user() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        assert_eq!(client.get("/saved/events").dispatch().await.status(), Status::Unauthorized);

        sign_in(&client).await;
        client.post("/cocktail/gin").dispatch().await;
        client.post("/saved").dispatch().await;
        let response = client.get("/saved/events").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        client.rocket().shutdown().notify();

        let body = response.into_string().await.unwrap();
        assert!(body.contains("\"mainSpirit\":\"Gin\""), "{}", body);
    }

    #[rocket::async_test]
    async fn unsolicited_sign_in_keeps_current_user() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        sign_in(&client).await;

        let response = client.post("/auth/sign_in")
            .header(ContentType::JSON)
            .body(serde_json::json!({ "identityToken": "garbage" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Unauthorized);

        let status: serde_json::Value = client.get("/auth").dispatch().await.into_json().await.unwrap();
        assert_eq!(status["state"], "authenticated");
        assert_eq!(status["user"]["id"], "user-1");
    }

    #[rocket::async_test]
    async fn signs_out_after_abandoned_challenge() {
        let directory = tempfile::tempdir().unwrap();
        let client = client(&directory).await;
        sign_in(&client).await;
        client.post("/auth/challenge").dispatch().await;

        let response = client.post("/auth/sign_out").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let status: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(status["state"], "unauthenticated");
        assert_eq!(client.get("/saved").dispatch().await.status(), Status::Unauthorized);
    }
}
