//! `spektr`: a line-oriented terminal driver for the client core.
//!
//! Reads one command per line from stdin and drives the same screens a
//! graphical shell would. Type `help` for the command list.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use spektr_client::auth::{AuthFlow, AuthStep};
use spektr_client::chat_list::{ChatList, ListRows};
use spektr_client::conversation::ConversationView;
use spektr_client::profile::{ProfileEditor, SaveOutcome};
use spektr_client::{App, ClientConfig, ClientError, Route};
use spektr_shared::constants::APP_NAME;
use spektr_shared::{ChatId, Language, Theme, UserId};

const HELP: &str = "\
commands:
  login <email> <password>
  register <username> <email> <password> <first name> [last name]
  code <digits>
  chats                      reload the chat list
  search [query]             search users; no query leaves search mode
  new <n>                    open a chat with the n-th search result
  open <chat id>
  say <text>                 send a message in the open chat
  show                       print the open chat
  block                      block the open chat's peer
  unblock <user id>
  back                       close the open chat
  profile                    show the profile draft
  set <field> <value>        field: username, email, first, last, language, theme
  avatar <file>              upload an image as the draft avatar
  save                       save the profile draft
  logout
  quit";

enum Flow {
    Continue,
    Quit,
}

struct Driver {
    app: App,
    auth: AuthFlow,
    list: ChatList,
    open: Option<ConversationView>,
    profile: Option<ProfileEditor>,
}

impl Driver {
    fn new(app: App) -> Self {
        let auth = app.auth_flow();
        let list = app.chat_list();
        Self {
            app,
            auth,
            list,
            open: None,
            profile: None,
        }
    }

    fn route(&self) -> Route {
        match (&self.open, self.app.route()) {
            (Some(view), Route::ChatList) => Route::Conversation(view.chat_id()),
            (_, route) => route,
        }
    }

    fn prompt(&self) -> String {
        match self.route() {
            Route::Auth => "auth> ".to_string(),
            Route::ChatList => "chats> ".to_string(),
            Route::Conversation(id) => format!("chat {id}> "),
        }
    }

    async fn handle(&mut self, line: &str) -> Result<Flow, ClientError> {
        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        match cmd {
            "" => {}
            "help" => println!("{HELP}"),
            "quit" | "exit" => return Ok(Flow::Quit),

            "login" => {
                let [email, password] = args.as_slice() else {
                    return Err(ClientError::validation("usage: login <email> <password>"));
                };
                self.ensure_form(AuthStep::LoggingIn);
                self.auth.login.email = email.to_string();
                self.auth.login.password = password.to_string();
                let step = self.auth.submit_login().await?;
                self.after_auth(step).await?;
            }
            "register" => {
                if args.len() < 4 {
                    return Err(ClientError::validation(
                        "usage: register <username> <email> <password> <first name> [last name]",
                    ));
                }
                self.ensure_form(AuthStep::Registering);
                let form = &mut self.auth.registration;
                form.username = args[0].to_string();
                form.email = args[1].to_string();
                form.password = args[2].to_string();
                form.first_name = args[3].to_string();
                form.last_name = args[4..].join(" ");
                let step = self.auth.submit_registration().await?;
                self.after_auth(step).await?;
            }
            "code" => {
                self.auth.set_code(rest);
                let identity = self.auth.submit_verification()?;
                println!("welcome, {}", identity.display_name());
                self.profile = None;
                self.list.sync_identity().await?;
                self.print_rows();
            }

            "chats" => {
                self.list.load_chats().await?;
                self.print_rows();
            }
            "search" => {
                self.list.search(rest).await?;
                self.print_rows();
            }
            "new" => {
                let index: usize = parse_arg(rest, "usage: new <n>")?;
                let entry = self
                    .list
                    .results()
                    .get(index.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| ClientError::validation("no such search result"))?;
                let chat_id = self.list.select_entry(&entry).await?;
                self.open_chat(chat_id).await?;
            }
            "open" => {
                let chat_id: ChatId = parse_arg(rest, "usage: open <chat id>")?;
                self.open_chat(chat_id).await?;
            }
            "unblock" => {
                let user = UserId(parse_arg(rest, "usage: unblock <user id>")?);
                self.list.unblock(user).await?;
                self.print_rows();
            }

            "say" => {
                let view = self.view()?;
                view.set_input(rest);
                view.send_message().await?;
                print_conversation(view);
            }
            "show" => print_conversation(self.view()?),
            "block" => {
                let route = self.view()?.block_peer().await?;
                if route == Route::ChatList {
                    self.close_chat();
                    self.list.load_chats().await?;
                    self.print_rows();
                }
            }
            "back" => {
                self.close_chat();
                self.print_rows();
            }

            "profile" => {
                let editor = self.editor()?;
                println!("{:#?}", editor.draft());
            }
            "set" => {
                let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
                set_field(self.editor()?, field, value.trim())?;
                println!("pending: {:?}", self.editor()?.pending_delta().field_names());
            }
            "avatar" => {
                let path = Path::new(rest);
                let bytes = tokio::fs::read(path)
                    .await
                    .map_err(|e| ClientError::validation(format!("cannot read {rest}: {e}")))?;
                let url = self.editor()?.upload_avatar(&bytes, mime_for(path)).await?;
                println!("avatar uploaded: {url} (save to keep it)");
            }
            "save" => match self.editor()?.save().await? {
                SaveOutcome::Unchanged => println!("nothing to save"),
                SaveOutcome::Saved(identity) => println!("saved {}", identity.display_name()),
            },
            "logout" => {
                self.close_chat();
                let editor = match self.profile.take() {
                    Some(editor) => editor,
                    None => self.app.profile_editor()?,
                };
                editor.logout()?;
                self.auth = self.app.auth_flow();
                self.list = self.app.chat_list();
                println!("signed out");
            }

            other => println!("unknown command `{other}`, try `help`"),
        }
        Ok(Flow::Continue)
    }

    fn ensure_form(&mut self, step: AuthStep) {
        if self.auth.step() == AuthStep::AwaitingVerification {
            self.auth.back_to_login();
        }
        if self.auth.step() != step {
            self.auth.toggle_mode();
        }
    }

    async fn after_auth(&mut self, step: AuthStep) -> Result<(), ClientError> {
        match step {
            AuthStep::AwaitingVerification => println!("enter the 6-digit code: code <digits>"),
            AuthStep::Authenticated => {
                self.profile = None;
                if let Some(identity) = self.app.session().current() {
                    println!("welcome, {}", identity.display_name());
                }
                self.list.sync_identity().await?;
                self.print_rows();
            }
            AuthStep::LoggingIn | AuthStep::Registering => {}
        }
        Ok(())
    }

    async fn open_chat(&mut self, chat_id: ChatId) -> Result<(), ClientError> {
        self.close_chat();
        let view = self.app.open_conversation(chat_id)?;
        // The poller's first load races this one; whichever was issued
        // later wins.
        view.load_history().await?;
        print_conversation(&view);
        self.open = Some(view);
        Ok(())
    }

    fn close_chat(&mut self) {
        if let Some(view) = self.open.take() {
            view.unmount();
        }
    }

    fn view(&self) -> Result<&ConversationView, ClientError> {
        self.open
            .as_ref()
            .ok_or_else(|| ClientError::validation("no chat is open"))
    }

    fn editor(&mut self) -> Result<&mut ProfileEditor, ClientError> {
        if self.profile.is_none() {
            self.profile = Some(self.app.profile_editor()?);
        }
        self.profile
            .as_mut()
            .ok_or(ClientError::NotAuthenticated)
    }

    fn print_rows(&self) {
        match self.list.rows() {
            ListRows::Chats([]) => println!("no chats yet; search for someone"),
            ListRows::Chats(chats) => {
                for chat in chats {
                    let last = chat.last_message.as_deref().unwrap_or("");
                    println!(
                        "[{}] {} {}  {}",
                        chat.chat_id, chat.first_name, chat.username, last
                    );
                }
            }
            ListRows::Directory([]) => println!("nobody found"),
            ListRows::Directory(entries) => {
                for (i, entry) in entries.iter().enumerate() {
                    println!("{}. {} {}", i + 1, entry.first_name, entry.username);
                }
            }
        }
    }
}

fn print_conversation(view: &ConversationView) {
    match view.peer() {
        Some(peer) => println!("-- {} {}", peer.first_name, peer.username),
        None => println!("-- chat {}", view.chat_id()),
    }
    for message in view.messages() {
        println!(
            "{} {}: {}",
            message.created_at.format("%H:%M"),
            message.first_name,
            message.text
        );
    }
    if let Some(error) = view.error() {
        println!("! {error}");
    }
}

fn set_field(editor: &mut ProfileEditor, field: &str, value: &str) -> Result<(), ClientError> {
    let draft = editor.draft_mut();
    match field {
        "username" => draft.username = value.to_string(),
        "email" => draft.email = value.to_string(),
        "first" => draft.first_name = value.to_string(),
        "last" => draft.last_name = value.to_string(),
        "language" => {
            draft.language = value
                .parse::<Language>()
                .map_err(|e| ClientError::validation(e.to_string()))?;
        }
        "theme" => {
            draft.theme = value
                .parse::<Theme>()
                .map_err(|e| ClientError::validation(e.to_string()))?;
        }
        other => return Err(ClientError::validation(format!("unknown field `{other}`"))),
    }
    Ok(())
}

fn parse_arg<T: std::str::FromStr>(raw: &str, usage: &str) -> Result<T, ClientError> {
    raw.parse().map_err(|_| ClientError::validation(usage))
}

fn mime_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    spektr_client::init_tracing();
    info!("Starting {} client v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = ClientConfig::from_env();
    info!(?config, "loaded configuration");

    let app = App::start(config)?;
    let mut driver = Driver::new(app);
    if driver.route() == Route::ChatList {
        if let Err(e) = driver.list.sync_identity().await {
            println!("! {}", e.user_message());
        }
        driver.print_rows();
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", driver.prompt());
        std::io::Write::flush(&mut std::io::stdout())?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match driver.handle(line.trim()).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("! {}", e.user_message()),
        }
    }

    driver.close_chat();
    Ok(())
}
