use std::time::Duration;

use super::browser::{PageSource, WaitOutcome};
use crate::error::AppError;

const USERNAME_INPUT: &str = "input[name='USERID']";
const PASSWORD_INPUT: &str = "input[name='USER_PWD']";
const SUBMIT_SCRIPT: &str = "go_submit();";
/// Date picker of the listing form, only rendered once logged in.
pub const LOGGED_IN_MARKER: &str = "#sStartDate";

pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub async fn login<P: PageSource + ?Sized>(
    page: &P,
    login_url: &str,
    credentials: &Credentials,
    timeout: Duration,
) -> Result<(), AppError> {
    page.goto(login_url).await?;

    page.fill(USERNAME_INPUT, &credentials.username).await?;
    page.fill(PASSWORD_INPUT, &credentials.password).await?;
    page.execute(SUBMIT_SCRIPT).await?;

    match page.wait_for(LOGGED_IN_MARKER, timeout).await? {
        WaitOutcome::Present => {
            tracing::info!("Logged in as {}", credentials.username);
            Ok(())
        }
        WaitOutcome::NotFound | WaitOutcome::TimedOut => Err(AppError::AuthError(format!(
            "'{}' did not appear within {}s after submitting credentials",
            LOGGED_IN_MARKER,
            timeout.as_secs()
        ))),
    }
}
