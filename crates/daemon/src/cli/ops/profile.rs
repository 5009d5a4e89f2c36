use clap::{Args, Subcommand};

use crate::cli::op::{to_pretty, Op, OpContext, RequestOpError};

crate::command_enum! {
    (Get, GetProfile),
    (Set, SetProfile),
}

pub type ProfileCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Profile {
    #[command(subcommand)]
    pub command: ProfileCommand,
}

#[async_trait::async_trait]
impl Op for Profile {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

/// Print this peer's profile
#[derive(Args, Debug, Clone)]
pub struct GetProfile;

#[async_trait::async_trait]
impl Op for GetProfile {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        let profile = ctx.requests().await?.profile.get_profile().await?;
        to_pretty(&profile)
    }
}

/// Update profile fields; unset flags keep their current value
#[derive(Args, Debug, Clone)]
pub struct SetProfile {
    /// Changing the peername re-labels every local dataset reference
    #[arg(long)]
    pub peername: Option<String>,

    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub homepage: Option<String>,
}

impl SetProfile {
    fn is_empty(&self) -> bool {
        self.peername.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.homepage.is_none()
    }
}

#[async_trait::async_trait]
impl Op for SetProfile {
    type Error = RequestOpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        if self.is_empty() {
            return Err(RequestOpError::Input(
                "nothing to change, pass at least one field".to_string(),
            ));
        }

        let requests = ctx.requests().await?;
        let mut profile = requests.profile.get_profile().await?;
        if let Some(peername) = &self.peername {
            profile.peername = peername.clone();
        }
        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(description) = &self.description {
            profile.description = Some(description.clone());
        }
        if let Some(homepage) = &self.homepage {
            profile.homepage = Some(homepage.clone());
        }

        let saved = requests.profile.save_profile(&profile).await?;
        to_pretty(&saved)
    }
}
