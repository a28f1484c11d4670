use rocket::serde::Serialize;

/// JSON body of every error response.
#[derive(Serialize, Debug)]
#[serde(crate = "rocket::serde")]
pub struct GenericError {
    pub message: String
}
