use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use anyhow::{Context as _, Result, bail};
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use grammers_client::session::Session;
use grammers_client::types::{Chat, Dialog};
use grammers_client::{Client, Config, InvocationError, SignInError};
use grammers_tl_types as tl;

use super::{ChatProvider, ProviderError, ProviderResult};
use crate::config::ApiConfig;
use crate::models::{DialogSummary, OwnMessage, PeerEntity};

/// Thin wrapper over the MTProto client. Entities are remembered by id as
/// they scroll past in the dialog list, because the raw API cannot address
/// a chat by bare id without the matching access hash.
pub struct TelegramProvider {
    client: Client,
    known_chats: Mutex<HashMap<i64, Chat>>,
}

impl TelegramProvider {
    /// Connects and, if the stored session is not yet authorized, walks the
    /// interactive login flow (phone, code, optional 2FA password).
    pub async fn connect(config: &ApiConfig) -> Result<Self> {
        let session = Session::load_file_or_create(&config.session_file)
            .with_context(|| format!("failed to load {}", config.session_file.display()))?;
        let client = Client::connect(Config {
            session,
            api_id: config.api_id,
            api_hash: config.api_hash.clone(),
            params: Default::default(),
        })
        .await
        .context("failed to connect to Telegram")?;

        if !client.is_authorized().await? {
            println!("🔑 First run, signing in...");
            let phone = prompt("Enter your phone number (international format): ")?;
            let token = client.request_login_code(phone.trim()).await?;
            let code = prompt("Enter the login code you received: ")?;
            match client.sign_in(&token, code.trim()).await {
                Ok(_) => {}
                Err(SignInError::PasswordRequired(password_token)) => {
                    let password = prompt("Enter your 2FA password: ")?;
                    client.check_password(password_token, password.trim()).await?;
                }
                Err(err) => bail!("sign in failed: {err}"),
            }
            client
                .session()
                .save_to_file(&config.session_file)
                .with_context(|| format!("failed to save {}", config.session_file.display()))?;
            println!("✅ Signed in, session saved");
        }

        Ok(Self {
            client,
            known_chats: Mutex::new(HashMap::new()),
        })
    }

    fn remember(&self, dialog: &Dialog) -> DialogSummary {
        let chat = dialog.chat();
        self.known_chats
            .lock()
            .unwrap()
            .insert(chat.id(), chat.clone());
        DialogSummary {
            entity: chat_to_entity(chat),
            last_message_date: dialog.last_message.as_ref().map(|message| message.date()),
            unread_count: match &dialog.raw {
                tl::enums::Dialog::Dialog(raw) => raw.unread_count,
                _ => 0,
            },
        }
    }

    fn lookup(&self, chat_id: i64) -> Option<Chat> {
        self.known_chats.lock().unwrap().get(&chat_id).cloned()
    }
}

#[async_trait]
impl ChatProvider for TelegramProvider {
    fn dialogs(&self) -> BoxStream<'_, ProviderResult<DialogSummary>> {
        let iter = self.client.iter_dialogs();
        stream::unfold((self, iter), |(this, mut iter)| async move {
            match iter.next().await {
                Ok(Some(dialog)) => Some((Ok(this.remember(&dialog)), (this, iter))),
                Ok(None) => None,
                Err(err) => Some((Err(map_invocation_error(err)), (this, iter))),
            }
        })
        .boxed()
    }

    async fn resolve(&self, chat_id: i64) -> ProviderResult<PeerEntity> {
        if let Some(chat) = self.lookup(chat_id) {
            return Ok(chat_to_entity(&chat));
        }
        // Not seen yet in this run; sweep the dialog list once to fill the
        // cache. Chats hidden from the dialog list stay unresolvable.
        let mut iter = self.client.iter_dialogs();
        loop {
            match iter.next().await {
                Ok(Some(dialog)) => {
                    self.remember(&dialog);
                    if dialog.chat().id() == chat_id {
                        return Ok(chat_to_entity(dialog.chat()));
                    }
                }
                Ok(None) => break,
                Err(err) => return Err(map_invocation_error(err)),
            }
        }
        Err(ProviderError::NotFound(chat_id))
    }

    async fn own_messages(
        &self,
        chat_id: i64,
        limit: Option<usize>,
    ) -> ProviderResult<Vec<OwnMessage>> {
        let chat = self.lookup(chat_id).ok_or(ProviderError::NotFound(chat_id))?;
        let mut iter = self.client.iter_messages(&chat);
        let mut found = Vec::new();
        loop {
            if limit.is_some_and(|cap| found.len() >= cap) {
                break;
            }
            match iter.next().await {
                Ok(Some(message)) => {
                    if message.outgoing() {
                        found.push(OwnMessage {
                            id: message.id(),
                            date: Some(message.date()),
                            text: message.text().to_string(),
                        });
                    }
                }
                Ok(None) => break,
                Err(err) => return Err(map_invocation_error(err)),
            }
        }
        Ok(found)
    }

    async fn delete_message(&self, chat_id: i64, message_id: i32) -> ProviderResult<()> {
        let chat = self.lookup(chat_id).ok_or(ProviderError::NotFound(chat_id))?;
        self.client
            .delete_messages(&chat, &[message_id])
            .await
            .map(|_| ())
            .map_err(map_invocation_error)
    }

    async fn search_directory(&self, query: &str) -> ProviderResult<Vec<PeerEntity>> {
        let request = tl::functions::contacts::Search {
            q: query.to_string(),
            limit: 100,
        };
        let tl::enums::contacts::Found::Found(found) = self
            .client
            .invoke(&request)
            .await
            .map_err(map_invocation_error)?;

        let mut entities = Vec::new();
        for user in found.users {
            if let Some(entity) = tl_user_to_entity(user) {
                entities.push(entity);
            }
        }
        for chat in found.chats {
            if let Some(entity) = tl_chat_to_entity(chat) {
                entities.push(entity);
            }
        }
        Ok(entities)
    }
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn chat_to_entity(chat: &Chat) -> PeerEntity {
    let name = non_empty(chat.name());
    match chat {
        Chat::User(user) => PeerEntity::Person {
            id: user.id(),
            first_name: name,
            last_name: None,
            username: chat.username().map(str::to_string),
            phone: None,
            bot: user.is_bot(),
        },
        Chat::Group(group) => PeerEntity::Group {
            id: group.id(),
            title: name,
            participants_count: None,
        },
        Chat::Channel(channel) => PeerEntity::Broadcast {
            id: channel.id(),
            title: name,
            username: chat.username().map(str::to_string),
            broadcast: true,
            participants_count: None,
        },
    }
}

fn tl_user_to_entity(user: tl::enums::User) -> Option<PeerEntity> {
    match user {
        tl::enums::User::User(user) => Some(PeerEntity::Person {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            phone: user.phone,
            bot: user.bot,
        }),
        tl::enums::User::Empty(_) => None,
    }
}

fn tl_chat_to_entity(chat: tl::enums::Chat) -> Option<PeerEntity> {
    match chat {
        tl::enums::Chat::Chat(chat) => Some(PeerEntity::Group {
            id: chat.id,
            title: Some(chat.title),
            participants_count: Some(chat.participants_count),
        }),
        tl::enums::Chat::Forbidden(chat) => Some(PeerEntity::Forbidden {
            id: chat.id,
            title: Some(chat.title),
            broadcast: None,
        }),
        tl::enums::Chat::Channel(channel) => Some(PeerEntity::Broadcast {
            id: channel.id,
            title: Some(channel.title),
            username: channel.username,
            broadcast: channel.broadcast,
            participants_count: channel.participants_count,
        }),
        tl::enums::Chat::ChannelForbidden(channel) => Some(PeerEntity::Forbidden {
            id: channel.id,
            title: Some(channel.title),
            broadcast: Some(channel.broadcast),
        }),
        tl::enums::Chat::Empty(_) => None,
    }
}

fn map_invocation_error(err: InvocationError) -> ProviderError {
    match err {
        InvocationError::Rpc(rpc) => {
            let name = rpc.name.as_str();
            if name.starts_with("FLOOD_WAIT") {
                ProviderError::RateLimited {
                    wait_secs: rpc.value.map(u64::from).unwrap_or(0),
                }
            } else if name == "SEARCH_QUERY_EMPTY" || name == "QUERY_TOO_SHORT" {
                ProviderError::EmptyQuery
            } else if name == "USER_NOT_PARTICIPANT" {
                ProviderError::NotParticipant
            } else if name.starts_with("CHAT_ADMIN_REQUIRED") {
                ProviderError::AdminRequired
            } else {
                ProviderError::Transport(rpc.to_string())
            }
        }
        other => ProviderError::Transport(other.to_string()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
