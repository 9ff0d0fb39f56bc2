use anyhow::Context;
use arena_client::{
    combat::{CombatController, ControllerError},
    config::settings,
    game::snapshot::Outcome,
    http::ratings,
    session::{
        self,
        store::{FileStore, LocalStore},
        Navigate, SessionEvent, SessionHandle, View,
    },
    ws::WsConnector,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "commands: login <token> | find | leave | skill <caster> <skill_id> | \
target <id> | remove <i> | move <from> <to> | end | show | quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let settings = settings();
    let config = settings.client_config();
    let store = FileStore::new(&settings.store_path);
    let persisted = store.load();

    let (handle, mut events, task) = session::spawn(
        config.clone(),
        WsConnector::new(config.channel_capacity),
        Box::new(store),
    );
    if let Some(token) = &settings.token {
        handle.login(token).context("session not running")?;
    }

    let mut controller =
        CombatController::new(handle.clone(), config.notice_ttl).with_player_id(persisted.player_id);
    let http = reqwest::Client::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");
    loop {
        tokio::select! {
            ev = events.recv() => {
                let Some(ev) = ev else { break };
                print_event(&ev);
                match controller.handle_event(&ev) {
                    Some(Navigate::PostGame) => {
                        // the session task keeps the store current, `login` included
                        let token = FileStore::new(&settings.store_path).load().token;
                        let rating = match token.as_deref() {
                            Some(t) => ratings::rating_after_game(&http, &settings.api_url, t).await,
                            None => None,
                        };
                        if let Some(summary) = controller.post_game(rating) {
                            let banner = match summary.outcome {
                                Outcome::Victory => "VICTORY",
                                Outcome::Defeat => "DEFEAT",
                                Outcome::Draw => "DRAW",
                            };
                            println!("== {banner} ==");
                            if let Some(line) = summary.final_log {
                                println!("{line}");
                            }
                            if let Some(r) = summary.rating {
                                println!("{} MMR", r.rating.round());
                            }
                        }
                        handle.leave_view(View::Battle)?;
                    }
                    Some(Navigate::Login) => println!("please log in: login <token>"),
                    Some(Navigate::Dashboard) => println!("back to the dashboard"),
                    Some(Navigate::Battle) => show(&controller),
                    None => {}
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !run_command(line.trim(), &handle, &mut controller) {
                    break;
                }
            }
        }
    }

    drop(handle);
    drop(controller);
    task.await.ok();
    Ok(())
}

/// Returns false on `quit`.
fn run_command(line: &str, handle: &SessionHandle, controller: &mut CombatController) -> bool {
    let mut words = line.split_whitespace();
    let result: Result<(), ControllerError> = match (words.next(), words.next(), words.next()) {
        (Some("quit"), ..) => return false,
        (Some("login"), Some(token), _) => handle.login(token).map_err(Into::into),
        (Some("find"), ..) => handle.find_match().map_err(Into::into),
        (Some("leave"), ..) => handle.leave().map_err(Into::into),
        (Some("skill"), Some(caster), Some(id)) => match id.parse() {
            Ok(id) => controller.select_skill(caster, id),
            Err(_) => {
                println!("skill id must be a number");
                Ok(())
            }
        },
        (Some("target"), Some(target), _) => controller.select_target(target),
        (Some("remove"), Some(i), _) => match i.parse() {
            Ok(i) => controller.remove_queued(i),
            Err(_) => {
                println!("index must be a number");
                Ok(())
            }
        },
        (Some("move"), Some(from), Some(to)) => match (from.parse(), to.parse()) {
            (Ok(from), Ok(to)) => controller.reorder_queued(from, to),
            _ => {
                println!("indices must be numbers");
                Ok(())
            }
        },
        (Some("end"), ..) => controller.submit_turn(),
        (Some("show"), ..) => {
            show(controller);
            Ok(())
        }
        (None, ..) => Ok(()),
        _ => {
            println!("{HELP}");
            Ok(())
        }
    };
    if let Err(e) = result {
        println!("! {e}");
    }
    true
}

fn print_event(ev: &SessionEvent) {
    match ev {
        SessionEvent::StateChanged(state) => println!("[session] {state}"),
        SessionEvent::Status { info, message } => {
            println!("[queue] {}", message.clone().unwrap_or_else(|| info.status_line()));
        }
        SessionEvent::GameStarted { player_id, .. } => println!("[match] found, you are {player_id}"),
        SessionEvent::Snapshot(s) => {
            if let Some(line) = s.last_log() {
                println!("[turn {}] {line}", s.turn);
            }
        }
        SessionEvent::GameOver(_) => println!("[match] game over"),
        SessionEvent::ActionRejected(reason) => println!("[rejected] {reason}"),
        SessionEvent::MatchmakingFailed(reason) => println!("[matchmaking] {reason}"),
        SessionEvent::ServerError(reason) => println!("[error] {reason}"),
        SessionEvent::OpponentLeft => println!("[match] opponent has disconnected"),
        SessionEvent::AuthRequired(reason) => println!("[auth] {reason}"),
        SessionEvent::Disconnected(reason) => {
            println!("[session] disconnected: {}", reason.as_deref().unwrap_or("-"));
        }
        SessionEvent::ConnectFailed(e) => println!("[session] connect failed: {e}"),
        SessionEvent::Undelivered(msg) => println!("[session] not sent: {msg:?}"),
    }
}

fn show(controller: &CombatController) {
    let Some(me) = controller.my_view() else {
        println!("{}", controller.status_line());
        return;
    };
    let turn = controller.snapshot().map_or(0, |s| s.turn);
    let whose = if controller.is_my_turn() { "your" } else { "opponent's" };
    println!("turn {turn} ({whose} turn), chakra {:?}", me.chakra.0);

    if let Some(them) = controller.opponent_view() {
        for c in &them.team {
            println!("  enemy {} {} {}/{}", c.instance_id, c.name, c.current_hp, c.max_hp);
        }
    }
    for c in &me.team {
        println!("  ally  {} {} {}/{}", c.instance_id, c.name, c.current_hp, c.max_hp);
        for skill in &c.skills {
            let state = controller
                .affordance(c, skill)
                .map(|a| format!("{a:?}"))
                .unwrap_or_default();
            println!("        [{}] {} {:?} {state}", skill.id, skill.name, skill.cost.0);
        }
    }
    for (i, entry) in me.action_queue.iter().enumerate() {
        println!("  queue #{i}: {} → {} on {}", entry.caster_instance_id, entry.skill.name, entry.target_id);
    }
}
