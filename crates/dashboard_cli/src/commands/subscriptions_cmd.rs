//! Subscription commands: the consumer screen.
//!
//! ```bash
//! webhook-dashboard subscriptions create --name Orders \
//!     --url https://shop.example.com/hooks --event order.created --event order.paid
//! webhook-dashboard subscriptions toggle 3
//! webhook-dashboard subscriptions delete 3 --yes
//! ```

use clap::Subcommand;
use dashboard_core::{ConsumerView, SubscriptionForm};
use tracing::{info, instrument};
use webhook_client::models::WebhookSubscription;

use crate::commands::{confirm, loaded, Context};
use crate::errors::Error;
use crate::output::{subscription_details, subscription_table, to_json};

#[cfg(test)]
#[path = "subscriptions_cmd_tests.rs"]
mod tests;

/// Subcommands for the subscriptions command
#[derive(Subcommand, Debug, Clone)]
pub enum SubscriptionsCommands {
    /// List subscriptions
    List {
        /// Only active subscriptions
        #[arg(long, conflicts_with_all = ["search", "event"])]
        active: bool,

        /// Text matched against name and URL, ignoring case
        #[arg(long, conflicts_with = "event")]
        search: Option<String>,

        /// Only active subscriptions listening to this event
        #[arg(long)]
        event: Option<String>,
    },

    /// Show one subscription
    Show {
        /// Subscription id
        id: String,
    },

    /// Create a subscription
    Create {
        #[arg(long)]
        name: String,

        /// Endpoint receiving the deliveries
        #[arg(long)]
        url: String,

        /// Event name to listen to, repeat for more
        #[arg(long = "event")]
        events: Vec<String>,

        /// Signing secret, generated when omitted
        #[arg(long)]
        secret: Option<String>,
    },

    /// Change fields of a subscription
    Update {
        /// Subscription id
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        url: Option<String>,

        /// Replaces the event list, repeat for more
        #[arg(long = "event")]
        events: Vec<String>,

        #[arg(long, conflicts_with = "generate_secret")]
        secret: Option<String>,

        /// Replace the secret with a generated one
        #[arg(long)]
        generate_secret: bool,
    },

    /// Activate an inactive subscription or deactivate an active one
    Toggle {
        /// Subscription id
        id: String,
    },

    /// Delete a subscription
    Delete {
        /// Subscription id
        id: String,

        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

/// Execute the subscriptions command
#[instrument(skip(context))]
pub async fn execute(cmd: SubscriptionsCommands, context: &Context) -> Result<String, Error> {
    match cmd {
        SubscriptionsCommands::List {
            active,
            search,
            event,
        } => list_subscriptions(context, active, search, event).await,
        SubscriptionsCommands::Show { id } => {
            let subscription = context.api.get_subscription(&id).await?;
            render_one(context, &subscription)
        }
        SubscriptionsCommands::Create {
            name,
            url,
            events,
            secret,
        } => {
            let mut view = ConsumerView::new(context.api.clone());
            view.form.name = name;
            view.form.url = url;
            set_event_fields(&mut view.form, &events);
            match secret {
                Some(secret) => view.form.secret = secret,
                None => view.form.generate_secret(),
            }

            let created = view.submit().await?;
            info!(subscription_id = created.id.as_str(), "Subscription created");
            render_one(context, &created)
        }
        SubscriptionsCommands::Update {
            id,
            name,
            url,
            events,
            secret,
            generate_secret,
        } => {
            let existing = context.api.get_subscription(&id).await?;
            let mut view = ConsumerView::new(context.api.clone());
            view.edit(&existing);
            if let Some(name) = name {
                view.form.name = name;
            }
            if let Some(url) = url {
                view.form.url = url;
            }
            if !events.is_empty() {
                set_event_fields(&mut view.form, &events);
            }
            if let Some(secret) = secret {
                view.form.secret = secret;
            } else if generate_secret {
                view.form.generate_secret();
            }

            let updated = view.submit().await?;
            render_one(context, &updated)
        }
        SubscriptionsCommands::Toggle { id } => {
            let existing = context.api.get_subscription(&id).await?;
            let mut view = ConsumerView::new(context.api.clone());
            let updated = view.toggle_active(&existing).await?;
            if context.is_json() {
                return to_json(&updated);
            }
            let state = if updated.is_active { "activated" } else { "deactivated" };
            Ok(format!("Subscription {} {}", updated.id, state))
        }
        SubscriptionsCommands::Delete { id, yes } => {
            if !yes && !confirm(&format!("Delete subscription {}?", id))? {
                return Err(Error::Cancelled);
            }
            let mut view = ConsumerView::new(context.api.clone());
            view.delete(&id).await?;
            Ok(format!("Deleted subscription {}", id))
        }
    }
}

/// Replaces every event field of the form with `events`.
fn set_event_fields(form: &mut SubscriptionForm, events: &[String]) {
    while form.remove_event_field(form.event_fields().len() - 1) {}
    form.update_event_field(0, "");
    for (index, event) in events.iter().enumerate() {
        if index > 0 {
            form.add_event_field();
        }
        form.update_event_field(index, event.as_str());
    }
}

async fn list_subscriptions(
    context: &Context,
    active: bool,
    search: Option<String>,
    event: Option<String>,
) -> Result<String, Error> {
    let subscriptions = if active {
        context.api.get_active_subscriptions().await?
    } else if let Some(query) = search {
        context.api.search_subscriptions(&query).await?
    } else if let Some(event) = event {
        context.api.get_subscriptions_by_event(&event).await?
    } else {
        let mut view = ConsumerView::new(context.api.clone());
        view.load().await;
        loaded(view.subscriptions())?.clone()
    };

    if context.is_json() {
        return to_json(&subscriptions);
    }
    Ok(subscription_table(&subscriptions))
}

fn render_one(context: &Context, subscription: &WebhookSubscription) -> Result<String, Error> {
    if context.is_json() {
        return to_json(subscription);
    }
    Ok(subscription_details(subscription))
}
