//! Roster enumeration over the People API plus per-user XSI sessions.

use crate::client::WebexClient;
use crate::xsi::XsiUserSession;
use async_trait::async_trait;
use callgate_monitor::{PhoneNumber, RosterMember, RosterSource};
use std::sync::Arc;

/// Enumerates the organization's Webex Calling users as roster members.
pub struct WebexRoster {
    client: WebexClient,
    http: reqwest::Client,
    actions_url: String,
    events_url: String,
    access_token: String,
    event_package: String,
}

impl WebexRoster {
    pub fn new(
        client: WebexClient,
        actions_url: &str,
        events_url: &str,
        access_token: &str,
        event_package: &str,
    ) -> Self {
        Self {
            client,
            http: reqwest::Client::new(),
            actions_url: actions_url.to_string(),
            events_url: events_url.to_string(),
            access_token: access_token.to_string(),
            event_package: event_package.to_string(),
        }
    }
}

#[async_trait]
impl RosterSource for WebexRoster {
    async fn members(&self) -> anyhow::Result<Vec<RosterMember>> {
        let people = self.client.calling_people().await?;
        let mut members = Vec::with_capacity(people.len());

        for person in people {
            let session = XsiUserSession::new(
                self.http.clone(),
                &self.actions_url,
                &self.events_url,
                &self.access_token,
                &person.id,
                &self.event_package,
            );

            // The XSI identity is what call events refer to; a member whose
            // profile cannot be resolved can never be matched to an event.
            let internal_id = match session.profile_user_id().await {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(
                        person_id = %person.id,
                        name = %person.display_name,
                        error = %e,
                        "skipping member without a resolvable XSI profile"
                    );
                    continue;
                }
            };

            // Missing numbers are tolerated; the member is still monitored.
            let phone_numbers = match self.client.person_numbers(&person.id).await {
                Ok(numbers) => numbers
                    .into_iter()
                    .filter_map(|n| {
                        n.direct_number.map(|number| PhoneNumber {
                            number,
                            extension: n.extension,
                            primary: n.primary,
                        })
                    })
                    .collect(),
                Err(e) => {
                    tracing::warn!(person_id = %person.id, error = %e, "could not list phone numbers");
                    Vec::new()
                }
            };

            members.push(RosterMember {
                internal_id,
                account_id: person.id,
                display_name: person.display_name,
                phone_numbers,
                calls: Arc::new(session),
            });
        }

        tracing::info!(members = members.len(), "enumerated calling roster");
        Ok(members)
    }
}
