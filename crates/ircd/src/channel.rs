//! Channel state: members, operators, invitations, topic and the enforced
//! modes `+i`, `+t`, `+k`, `+l` (plus the per-member operator flag).

use dashmap::{DashMap, DashSet};
use tokio::sync::RwLock;

use crate::session::{ClientId, Session};

pub type ChannelName = String;

#[derive(Debug, Clone, Default)]
pub struct ChannelModes {
    pub invite_only: bool,           // +i
    pub topic_protected: bool,       // +t
    pub key: Option<String>,         // +k <key>
    pub user_limit: Option<usize>,   // +l <count>
}

/// Why an admission attempt was refused, in policy order.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinDenied {
    AlreadyMember,
    InviteOnly,
    BadKey,
    ChannelFull,
}

#[derive(Debug)]
pub struct IrcChannel {
    pub name: ChannelName,
    topic: RwLock<Option<String>>,
    members: DashSet<ClientId>,
    operators: DashSet<ClientId>,
    invited: DashSet<ClientId>,
    modes: RwLock<ChannelModes>,
}

impl IrcChannel {
    pub fn new(name: ChannelName) -> Self {
        IrcChannel {
            name,
            topic: RwLock::new(None),
            members: DashSet::new(),
            operators: DashSet::new(),
            invited: DashSet::new(),
            modes: RwLock::new(ChannelModes::default()),
        }
    }

    pub fn add_member(&self, client_id: ClientId) -> bool {
        self.members.insert(client_id)
    }

    /// Unlinks a client from every per-channel collection. The caller owns
    /// the matching update of the session's joined-channel list.
    pub fn remove_member(&self, client_id: ClientId) {
        let _ = self.members.remove(&client_id);
        let _ = self.operators.remove(&client_id);
        let _ = self.invited.remove(&client_id);
    }

    /// Operators are always members.
    pub fn add_operator(&self, client_id: ClientId) {
        self.members.insert(client_id);
        self.operators.insert(client_id);
    }

    pub fn remove_operator(&self, client_id: ClientId) {
        let _ = self.operators.remove(&client_id);
    }

    pub fn add_invited(&self, client_id: ClientId) {
        self.invited.insert(client_id);
    }

    pub fn is_member(&self, client_id: ClientId) -> bool {
        self.members.contains(&client_id)
    }

    pub fn is_operator(&self, client_id: ClientId) -> bool {
        self.operators.contains(&client_id)
    }

    pub fn is_invited(&self, client_id: ClientId) -> bool {
        self.invited.contains(&client_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member_ids(&self) -> Vec<ClientId> {
        self.members.iter().map(|id| *id).collect()
    }

    pub async fn topic(&self) -> Option<String> {
        self.topic.read().await.clone()
    }

    pub async fn set_topic(&self, topic: String) {
        *self.topic.write().await = Some(topic);
    }

    pub async fn modes(&self) -> ChannelModes {
        self.modes.read().await.clone()
    }

    pub async fn set_invite_only(&self, on: bool) {
        self.modes.write().await.invite_only = on;
    }

    pub async fn set_topic_protected(&self, on: bool) {
        self.modes.write().await.topic_protected = on;
    }

    pub async fn set_key(&self, key: Option<String>) {
        self.modes.write().await.key = key;
    }

    pub async fn set_user_limit(&self, limit: Option<usize>) {
        self.modes.write().await.user_limit = limit;
    }

    /// Current mode string in `+itkl` order, for RPL_CHANNELMODEIS.
    pub async fn mode_string(&self) -> String {
        let modes = self.modes.read().await;
        let mut out = String::from("+");
        if modes.invite_only {
            out.push('i');
        }
        if modes.topic_protected {
            out.push('t');
        }
        if modes.key.is_some() {
            out.push('k');
        }
        if modes.user_limit.is_some() {
            out.push('l');
        }
        out
    }

    /// Admission policy for JOIN, first failure wins: already a member,
    /// invite-only without invitation, wrong key, channel full.
    pub async fn check_admission(
        &self,
        client_id: ClientId,
        key: Option<&str>,
    ) -> Result<(), JoinDenied> {
        if self.is_member(client_id) {
            return Err(JoinDenied::AlreadyMember);
        }
        let modes = self.modes.read().await;
        if modes.invite_only && !self.is_invited(client_id) {
            return Err(JoinDenied::InviteOnly);
        }
        if let Some(channel_key) = &modes.key {
            if key != Some(channel_key.as_str()) {
                return Err(JoinDenied::BadKey);
            }
        }
        if let Some(limit) = modes.user_limit {
            if self.member_count() >= limit {
                return Err(JoinDenied::ChannelFull);
            }
        }
        Ok(())
    }

    /// Fans one line out to every member except the optional sender. The
    /// client map is snapshotted before any await so no map lock is held
    /// across suspension points.
    pub async fn broadcast(
        &self,
        clients: &DashMap<ClientId, Session>,
        line: &str,
        except: Option<ClientId>,
    ) {
        let recipients: Vec<Session> = self
            .member_ids()
            .into_iter()
            .filter(|id| Some(*id) != except)
            .filter_map(|id| clients.get(&id).map(|entry| entry.value().clone()))
            .collect();
        for session in recipients {
            session.send(line.to_owned()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_is_always_member() {
        let channel = IrcChannel::new("#rust".to_owned());
        channel.add_operator(7);
        assert!(channel.is_member(7));
        assert!(channel.is_operator(7));
    }

    #[test]
    fn removing_member_clears_every_role() {
        let channel = IrcChannel::new("#rust".to_owned());
        channel.add_operator(7);
        channel.add_invited(7);
        channel.remove_member(7);
        assert!(!channel.is_member(7));
        assert!(!channel.is_operator(7));
        assert!(!channel.is_invited(7));
        assert!(channel.is_empty());
    }

    #[test]
    fn duplicate_membership_is_rejected() {
        let channel = IrcChannel::new("#rust".to_owned());
        assert!(channel.add_member(1));
        assert!(!channel.add_member(1));
        assert_eq!(channel.member_count(), 1);
    }

    #[tokio::test]
    async fn admission_rejects_in_policy_order() {
        let channel = IrcChannel::new("#gate".to_owned());
        channel.add_member(1);
        channel.set_invite_only(true).await;
        channel.set_key(Some("secret".to_owned())).await;
        channel.set_user_limit(Some(1)).await;

        // membership wins over every mode check
        assert_eq!(
            channel.check_admission(1, None).await,
            Err(JoinDenied::AlreadyMember)
        );
        // +i outranks +k and +l
        assert_eq!(
            channel.check_admission(2, Some("secret")).await,
            Err(JoinDenied::InviteOnly)
        );
        channel.add_invited(2);
        // then the key is checked
        assert_eq!(
            channel.check_admission(2, Some("wrong")).await,
            Err(JoinDenied::BadKey)
        );
        // then the limit
        assert_eq!(
            channel.check_admission(2, Some("secret")).await,
            Err(JoinDenied::ChannelFull)
        );
        channel.set_user_limit(Some(2)).await;
        assert_eq!(channel.check_admission(2, Some("secret")).await, Ok(()));
    }

    #[tokio::test]
    async fn invite_bypasses_invite_only_but_not_key() {
        let channel = IrcChannel::new("#private".to_owned());
        channel.add_operator(1);
        channel.set_invite_only(true).await;
        assert_eq!(
            channel.check_admission(2, None).await,
            Err(JoinDenied::InviteOnly)
        );
        channel.add_invited(2);
        assert_eq!(channel.check_admission(2, None).await, Ok(()));
    }

    #[tokio::test]
    async fn mode_string_reflects_active_modes() {
        let channel = IrcChannel::new("#modes".to_owned());
        assert_eq!(channel.mode_string().await, "+");
        channel.set_invite_only(true).await;
        channel.set_key(Some("k".to_owned())).await;
        assert_eq!(channel.mode_string().await, "+ik");
        channel.set_invite_only(false).await;
        channel.set_topic_protected(true).await;
        channel.set_user_limit(Some(5)).await;
        assert_eq!(channel.mode_string().await, "+tkl");
    }
}
