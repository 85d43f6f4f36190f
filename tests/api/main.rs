mod content;
mod feeds;
mod health_check;
mod helpers;
mod subscriptions_confirm;
mod subscriptions_export;
