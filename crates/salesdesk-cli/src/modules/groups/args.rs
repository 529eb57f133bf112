use clap::{Args, Subcommand};
use uuid::Uuid;

#[derive(Args)]
pub struct GroupArgs {
    #[command(subcommand)]
    pub command: GroupCommand,
}

#[derive(Subcommand)]
pub enum GroupCommand {
    List(GroupListArgs),
    Get(GroupGetArgs),
    #[command(about = "Create a group, then add the given members in one batch")]
    Create(GroupCreateArgs),
    #[command(about = "Edit fields and membership, rolling back on failure")]
    Edit(GroupEditArgs),
    Delete(GroupGetArgs),
    #[command(about = "Replace the membership with exactly the given users")]
    SetMembers(GroupSetMembersArgs),
    AddMember(GroupMemberArgs),
    RemoveMember(GroupMemberArgs),
}

#[derive(Args)]
pub struct GroupListArgs {
    #[arg(long)]
    pub limit: Option<i64>,
    #[arg(long)]
    pub offset: Option<i64>,
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Args)]
pub struct GroupGetArgs {
    pub id: Uuid,
}

#[derive(Args)]
pub struct GroupCreateArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub leader: Option<Uuid>,
    #[arg(long = "member")]
    pub members: Vec<Uuid>,
}

#[derive(Args)]
pub struct GroupEditArgs {
    pub id: Uuid,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub leader: Option<Uuid>,
    #[arg(long = "add")]
    pub add: Vec<Uuid>,
    #[arg(long = "remove")]
    pub remove: Vec<Uuid>,
}

#[derive(Args)]
pub struct GroupSetMembersArgs {
    pub id: Uuid,
    pub user_ids: Vec<Uuid>,
}

#[derive(Args)]
pub struct GroupMemberArgs {
    pub id: Uuid,
    pub user_id: Uuid,
}
