// location-bingo/src/controller.rs
// This module owns the card state, applies user actions and mirrors the result into the page location.

use url::Url;

use crate::board::{BoardState, CompletedLines, check_lines};
use crate::codec::BoardQuery;
use crate::defs::{FREE_CELL, QR_ENDPOINT, QR_SIZE, RESET_PROMPT};
use crate::error::Result;
use crate::logging::{log_info, log_warning};
use crate::reward::{RewardCode, generate_reward_code};

/// Platform services the controller needs from whatever front end drives it.
pub trait Host {
    /// Blocking yes/no question. `false` means the user declined.
    fn confirm(&mut self, prompt: &str) -> bool;

    fn copy_text(&mut self, text: &str) -> Result<()>;

    /// Transient message shown to the user.
    fn notify(&mut self, message: &str);
}

/// Path plus the bingo query parameters, i.e. what the address bar shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLocation {
    pub path: String,
    pub query: BoardQuery,
}

impl PageLocation {
    pub fn new(path: &str, query: &str) -> Self {
        let path = if path.is_empty() { "/" } else { path };
        PageLocation {
            path: path.to_string(),
            query: BoardQuery::parse(query),
        }
    }

    /// Path and query, e.g. `/?state=...&coupon=...`, or the bare path.
    pub fn relative(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query.to_query_string())
        }
    }

    pub fn absolute(&self, base: &Url) -> Url {
        base.join(&self.relative()).unwrap_or_else(|_| base.clone())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub index: usize,
    pub visited: bool,
    pub completed: CompletedLines,
    /// Set only on the toggle that issued the session's reward.
    pub reward: Option<RewardCode>,
}

#[derive(Clone, Debug)]
pub struct BoardController {
    state: BoardState,
    reward: Option<RewardCode>,
    location: PageLocation,
}

impl Default for BoardController {
    fn default() -> Self {
        Self::from_location("/", "")
    }
}

impl BoardController {
    /// Restores the game from a path and query string. A missing or broken
    /// `state` parameter yields the fresh card.
    pub fn from_location(path: &str, query: &str) -> Self {
        let location = PageLocation::new(path, query);

        let state = match location.query.board_state() {
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                log_warning(&format!("Ignoring state parameter: {e}"));
                BoardState::new()
            }
            None => BoardState::new(),
        };
        let reward = location.query.reward_code();

        BoardController { state, reward, location }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_location(url.path(), url.query().unwrap_or(""))
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    pub fn reward_code(&self) -> Option<&RewardCode> {
        self.reward.as_ref()
    }

    pub fn location(&self) -> &PageLocation {
        &self.location
    }

    pub fn visited_count(&self) -> usize {
        self.state.visited_count()
    }

    pub fn progress_percent(&self) -> u8 {
        self.state.progress_percent()
    }

    pub fn completed_lines(&self) -> CompletedLines {
        check_lines(&self.state)
    }

    pub fn toggle_cell(&mut self, index: usize) -> Result<ToggleOutcome> {
        let next = self.state.toggled(index)?;
        let before = check_lines(&self.state);
        if index == FREE_CELL {
            // Always visited; neither the card nor the address bar changes.
            return Ok(ToggleOutcome { index, visited: true, completed: before, reward: None });
        }
        let after = check_lines(&next);
        let visited = next.is_visited(index);

        let mut issued = None;
        if after.is_strict_superset_of(&before)
            && visited
            && self.reward.is_none()
            && let Some(line) = after.first_new_since(&before)
        {
            let code = generate_reward_code(line.kind);
            log_info(&format!("Bingo on {} line {}: issued reward {code}", line.kind.name(), line.index));
            self.reward = Some(code.clone());
            issued = Some(code);
        }

        self.state = next;
        self.persist();

        Ok(ToggleOutcome { index, visited, completed: after, reward: issued })
    }

    /// Asks the host first; on refusal nothing changes and `false` is returned.
    pub fn reset<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        if !host.confirm(RESET_PROMPT) {
            return false;
        }
        self.state = BoardState::new();
        self.reward = None;
        self.location.query = BoardQuery::default();
        log_info("Card reset");
        true
    }

    pub fn share_url(&self, base: &Url) -> Url {
        self.location.absolute(base)
    }

    pub fn qr_code_url(&self, base: &Url) -> Url {
        let mut qr = Url::parse(QR_ENDPOINT).unwrap_or_else(|_| base.clone());
        qr.query_pairs_mut()
            .append_pair("size", QR_SIZE)
            .append_pair("data", self.share_url(base).as_str());
        qr
    }

    /// Copy failures are reported to the user and returned, state is untouched.
    pub fn copy_share_url<H: Host + ?Sized>(&self, host: &mut H, base: &Url) -> Result<()> {
        match host.copy_text(self.share_url(base).as_str()) {
            Ok(()) => {
                host.notify("URLをコピーしました!");
                Ok(())
            }
            Err(e) => {
                log_warning(&format!("Copy to clipboard failed: {e}"));
                host.notify("URLをコピーできませんでした");
                Err(e)
            }
        }
    }

    // The address bar is replaced, never pushed.
    fn persist(&mut self) {
        self.location.query = BoardQuery::from_board(&self.state, self.reward.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::LineKind;
    use crate::defs::CELLCOUNT;
    use crate::error::BingoError;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[derive(Default)]
    struct FakeHost {
        answer: bool,
        clipboard_broken: bool,
        prompts: Vec<String>,
        copied: Vec<String>,
        notices: Vec<String>,
    }

    impl Host for FakeHost {
        fn confirm(&mut self, prompt: &str) -> bool {
            self.prompts.push(prompt.to_string());
            self.answer
        }

        fn copy_text(&mut self, text: &str) -> Result<()> {
            if self.clipboard_broken {
                return Err(BingoError::Clipboard("permission denied".to_string()));
            }
            self.copied.push(text.to_string());
            Ok(())
        }

        fn notify(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    fn base() -> Url {
        Url::parse("http://127.0.0.1:3000/").unwrap()
    }

    fn assert_reward_shape(code: &RewardCode, tag: &str) {
        let parts: Vec<&str> = code.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], tag);
        assert!(!parts[1].is_empty());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[1..].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())));
    }

    #[test]
    fn test_row_bingo_issues_horizontal_reward() {
        let mut controller = BoardController::default();
        for index in 0..4 {
            let outcome = controller.toggle_cell(index).unwrap();
            assert!(outcome.visited);
            assert!(outcome.reward.is_none());
        }

        let outcome = controller.toggle_cell(4).unwrap();
        assert!(outcome.completed.contains(0));
        let code = outcome.reward.unwrap();
        assert_reward_shape(&code, "H");
        assert_eq!(controller.reward_code(), Some(&code));
        assert_eq!(controller.location().query.coupon.as_deref(), Some(code.as_str()));
    }

    #[test]
    fn test_diagonal_bingo_after_four_toggles() {
        let mut controller = BoardController::default();
        for index in [0, 6, 18] {
            assert!(controller.toggle_cell(index).unwrap().reward.is_none());
        }
        let outcome = controller.toggle_cell(24).unwrap();
        assert_reward_shape(outcome.reward.as_ref().unwrap(), "D");
    }

    #[test]
    fn test_only_first_bingo_is_rewarded() {
        let mut controller = BoardController::default();
        for index in [0, 5, 10, 15, 20] {
            controller.toggle_cell(index).unwrap();
        }
        let first = controller.reward_code().cloned().unwrap();
        assert_reward_shape(&first, "V");

        for index in [1, 2, 3, 4] {
            assert!(controller.toggle_cell(index).unwrap().reward.is_none());
        }
        assert_eq!(controller.completed_lines().len(), 2);
        assert_eq!(controller.reward_code(), Some(&first));

        // Un-visit and re-visit a cell of the rewarded line.
        controller.toggle_cell(0).unwrap();
        assert!(controller.toggle_cell(0).unwrap().reward.is_none());
        assert_eq!(controller.reward_code(), Some(&first));
    }

    #[test]
    fn test_unvisiting_never_rewards() {
        let mut controller = BoardController::default();
        for index in [0, 1, 2, 3, 4] {
            controller.toggle_cell(index).unwrap();
        }
        let outcome = controller.toggle_cell(4).unwrap();
        assert!(!outcome.visited);
        assert!(outcome.reward.is_none());
        assert!(outcome.completed.is_empty());
    }

    #[test]
    fn test_free_cell_toggle_is_noop() {
        let mut controller = BoardController::default();
        let before = *controller.state();
        let outcome = controller.toggle_cell(FREE_CELL).unwrap();
        assert!(outcome.visited);
        assert!(outcome.reward.is_none());
        assert_eq!(*controller.state(), before);
        assert!(controller.reward_code().is_none());
        assert!(controller.location().query.is_empty());
        assert_eq!(controller.location().relative(), "/");

        // Same on a card restored from a link: the query stays verbatim.
        let mut restored = BoardController::from_location("/", "state=MDAwMDAwMDAwMDAwMDAwMDAwMDAwMDAwMA&coupon=V-1-ABCDEFGH");
        let location = restored.location().clone();
        let outcome = restored.toggle_cell(FREE_CELL).unwrap();
        assert!(outcome.completed.is_empty());
        assert_eq!(restored.location(), &location);
    }

    #[test]
    fn test_random_play_keeps_free_cell_and_single_reward() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut controller = BoardController::default();
            let mut first: Option<RewardCode> = None;
            let mut issued = 0;
            for _ in 0..60 {
                let index = rng.random_range(0..CELLCOUNT);
                let outcome = controller.toggle_cell(index).unwrap();
                assert!(controller.state().is_visited(FREE_CELL));
                assert_eq!(outcome.completed, controller.completed_lines());
                if let Some(code) = outcome.reward {
                    issued += 1;
                    first = Some(code);
                }
                assert_eq!(controller.reward_code(), first.as_ref());
            }
            assert!(issued <= 1);
        }
    }

    #[test]
    fn test_out_of_range_toggle_leaves_location_alone() {
        let mut controller = BoardController::default();
        assert!(controller.toggle_cell(40).is_err());
        assert!(controller.location().query.is_empty());
    }

    #[test]
    fn test_toggle_writes_state_to_location() {
        let mut controller = BoardController::default();
        controller.toggle_cell(3).unwrap();

        let restored = BoardController::from_location("/", &controller.location().query.to_query_string());
        assert_eq!(restored.state(), controller.state());
        assert!(restored.state().is_visited(3));
        assert!(controller.location().query.coupon.is_none());
    }

    #[test]
    fn test_malformed_state_falls_back_to_default() {
        let controller = BoardController::from_location("/", "state=not-base64!!&coupon=D-1-ABCDEFGH");
        assert_eq!(*controller.state(), BoardState::new());
        assert_eq!(controller.reward_code().map(RewardCode::as_str), Some("D-1-ABCDEFGH"));
    }

    #[test]
    fn test_restored_reward_blocks_new_reward() {
        let mut controller = BoardController::from_location("/", "coupon=H-XYZ-12345678");
        for index in [0, 1, 2, 3, 4] {
            assert!(controller.toggle_cell(index).unwrap().reward.is_none());
        }
        assert_eq!(controller.reward_code().unwrap().as_str(), "H-XYZ-12345678");
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let mut controller = BoardController::default();
        controller.toggle_cell(7).unwrap();
        let mut host = FakeHost::default();

        assert!(!controller.reset(&mut host));
        assert!(controller.state().is_visited(7));
        assert_eq!(host.prompts.len(), 1);

        for index in [0, 1, 2, 3, 4] {
            controller.toggle_cell(index).unwrap();
        }
        host.answer = true;
        assert!(controller.reset(&mut host));
        assert_eq!(controller.visited_count(), 1);
        assert!(controller.reward_code().is_none());
        assert_eq!(controller.location().relative(), "/");
    }

    #[test]
    fn test_reward_available_again_after_reset() {
        let mut controller = BoardController::default();
        let mut host = FakeHost { answer: true, ..Default::default() };
        for index in [0, 1, 2, 3, 4] {
            controller.toggle_cell(index).unwrap();
        }
        controller.reset(&mut host);

        for index in [2, 7, 17] {
            controller.toggle_cell(index).unwrap();
        }
        let outcome = controller.toggle_cell(22).unwrap();
        assert_eq!(outcome.reward.unwrap().line_kind(), Some(LineKind::Vertical));
    }

    #[test]
    fn test_progress_values() {
        let mut controller = BoardController::default();
        assert_eq!(controller.progress_percent(), 4);
        controller.toggle_cell(0).unwrap();
        controller.toggle_cell(1).unwrap();
        assert_eq!(controller.visited_count(), 3);
        assert_eq!(controller.progress_percent(), 12);
    }

    #[test]
    fn test_share_and_qr_urls() {
        let mut controller = BoardController::default();
        assert_eq!(controller.share_url(&base()).as_str(), "http://127.0.0.1:3000/");

        controller.toggle_cell(0).unwrap();
        let share = controller.share_url(&base());
        assert!(share.as_str().starts_with("http://127.0.0.1:3000/?state="));

        let qr = controller.qr_code_url(&base());
        assert!(qr.as_str().starts_with("https://api.qrserver.com/v1/create-qr-code/?size=300x300&data=http%3A%2F%2F127.0.0.1%3A3000%2F%3Fstate%3D"));
        let data = qr.query_pairs().find(|(k, _)| k == "data").map(|(_, v)| v.into_owned());
        assert_eq!(data.as_deref(), Some(share.as_str()));
    }

    #[test]
    fn test_copy_share_url() {
        let controller = BoardController::default();
        let mut host = FakeHost::default();
        controller.copy_share_url(&mut host, &base()).unwrap();
        assert_eq!(host.copied, vec!["http://127.0.0.1:3000/".to_string()]);
        assert_eq!(host.notices.len(), 1);
    }

    #[test]
    fn test_copy_failure_is_reported_not_fatal() {
        let mut controller = BoardController::default();
        controller.toggle_cell(1).unwrap();
        let snapshot = controller.location().clone();
        let mut host = FakeHost { clipboard_broken: true, ..Default::default() };

        assert!(matches!(controller.copy_share_url(&mut host, &base()), Err(BingoError::Clipboard(_))));
        assert_eq!(host.notices.len(), 1);
        assert_eq!(controller.location(), &snapshot);
    }
}
