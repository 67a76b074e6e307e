//! Room Registry: 在室状態の唯一の所有者
//!
//! セッションテーブル、ルームごとのライブセッション集合、タイピング
//! 中マップ、デフォルトルームのリングバッファを一箇所で管理します。
//! すべての変更は `Arc<Mutex<RoomRegistry>>` 越しに直列化され、
//! ブロードキャスト用のスナップショットは変更と同じロック区間で
//! 計算されます（変更後に古いロスターを配ることがない）。
//!
//! ## 不変条件
//!
//! - 接続は明示的に join して leave/切断していない間だけライブ集合に
//!   現れる
//! - 非デフォルトルームのライブ在室は接続ごとに高々 1 つ。
//!   デフォルトルームの在室は常に並行して維持される
//! - デフォルトルームの履歴は最大 100 件（古いものから追い出し）
//! - 変更操作は全て適用されるか、全く適用されないかのどちらか

use std::collections::{HashMap, VecDeque};

use super::entity::{ChatMessage, Identity};
use super::value_object::{ConnectionId, RoomId, Username};

/// デフォルトルームのリングバッファ容量
pub const LOBBY_HISTORY_CAP: usize = 100;

/// ルームの現在のロスター（connection_id → username）
pub type Roster = HashMap<ConnectionId, Username>;

/// join 適用後のスナップショット
#[derive(Debug, Clone)]
pub struct JoinEffect {
    /// 参加先ルームの適用後ロスター
    pub roster: Roster,
    /// デフォルトルームへの参加なら、その履歴のスナップショット
    pub history: Option<Vec<ChatMessage>>,
    /// 追い出された旧ルーム（非デフォルトルームの二重在室は不可）
    pub evicted: Option<EvictedRoom>,
}

/// join によって離脱させられた旧ルームの状態
#[derive(Debug, Clone)]
pub struct EvictedRoom {
    pub room_id: RoomId,
    /// 離脱適用後のロスター
    pub roster: Roster,
    /// 旧ルームでタイピング中だった場合 true（stop を配る必要がある）
    pub typing_stopped: bool,
}

/// leave 適用後のスナップショット
#[derive(Debug, Clone)]
pub struct LeaveEffect {
    pub roster: Roster,
    pub typing_stopped: bool,
}

/// 切断で影響を受けたルーム（1 ルームにつき 1 エントリ）
#[derive(Debug, Clone)]
pub struct AffectedRoom {
    pub room_id: RoomId,
    pub roster: Roster,
    pub typing_stopped: bool,
}

/// disconnect 適用後のスナップショット
///
/// 2 回目以降の呼び出しでは `rooms` は空になる（冪等）。
#[derive(Debug, Clone, Default)]
pub struct DisconnectEffect {
    pub rooms: Vec<AffectedRoom>,
}

/// send 適用後のスナップショット
#[derive(Debug, Clone)]
pub struct SendEffect {
    /// 配信対象（送信者を含むルームの全ライブ接続）
    pub targets: Vec<ConnectionId>,
    /// 送信者のタイピング表示を消した場合 true
    pub typing_stopped: bool,
}

/// typing-start 適用後のスナップショット
#[derive(Debug, Clone)]
pub struct TypingStart {
    pub username: Username,
    /// 送信者以外のルームメンバー
    pub targets: Vec<ConnectionId>,
}

/// インメモリの在室・タイピング・セッション状態
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// 接続ごとの認証済みアイデンティティ
    sessions: HashMap<ConnectionId, Identity>,
    /// ルームごとのライブセッション集合
    live: HashMap<RoomId, Roster>,
    /// ルームごとのタイピング中マップ
    typing: HashMap<RoomId, Roster>,
    /// 接続が現在在室している非デフォルトルーム
    active_room: HashMap<ConnectionId, RoomId>,
    /// デフォルトルームの履歴（最大 LOBBY_HISTORY_CAP 件）
    lobby_history: VecDeque<ChatMessage>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// ルームのライブ集合を取得（なければ空で作る、冪等）
    fn ensure_room(&mut self, room_id: &RoomId) -> &mut Roster {
        self.live.entry(room_id.clone()).or_default()
    }

    /// 接続の認証済みアイデンティティ
    pub fn identity_of(&self, connection_id: &ConnectionId) -> Option<&Identity> {
        self.sessions.get(connection_id)
    }

    /// 登録済みの全接続（room-catalog-changed のヒント配信用）
    pub fn all_connections(&self) -> Vec<ConnectionId> {
        self.sessions.keys().cloned().collect()
    }

    /// ルームの現在のロスター
    pub fn roster(&self, room_id: &RoomId) -> Roster {
        self.live.get(room_id).cloned().unwrap_or_default()
    }

    /// 認証直後の接続を登録し、デフォルトルームに入室させる
    ///
    /// 戻り値はデフォルトルームの適用後ロスター。
    pub fn connect(&mut self, connection_id: ConnectionId, identity: Identity) -> Roster {
        let username = identity.username.clone();
        self.sessions.insert(connection_id.clone(), identity);
        let default_room = RoomId::default_room();
        let members = self.ensure_room(&default_room);
        members.insert(connection_id, username);
        members.clone()
    }

    /// 接続をルームに入室させる
    ///
    /// 非デフォルトルームへの入室は、既に在室している別の非デフォルト
    /// ルームからの離脱を伴う。デフォルトルームへの入室は冪等で、
    /// 在室中の非デフォルトルームには影響しない。
    ///
    /// セッションが存在しない場合は None（状態は変更されない）。
    pub fn join(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> Option<JoinEffect> {
        let username = self.sessions.get(connection_id)?.username.clone();

        let mut evicted = None;
        if !room_id.is_default() {
            if let Some(previous) = self.active_room.insert(connection_id.clone(), room_id.clone())
            {
                if previous != *room_id {
                    evicted = Some(self.remove_live(connection_id, &previous));
                }
            }
        }

        let members = self.ensure_room(room_id);
        members.insert(connection_id.clone(), username);
        let roster = members.clone();

        let history = room_id
            .is_default()
            .then(|| self.lobby_history.iter().cloned().collect());

        Some(JoinEffect {
            roster,
            history,
            evicted,
        })
    }

    /// 接続をルームから離脱させる
    ///
    /// ライブメンバーでなければ None（エラーではなく no-op）。
    pub fn leave(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> Option<LeaveEffect> {
        if !self
            .live
            .get(room_id)
            .is_some_and(|members| members.contains_key(connection_id))
        {
            return None;
        }
        if self.active_room.get(connection_id) == Some(room_id) {
            self.active_room.remove(connection_id);
        }
        let effect = self.remove_live(connection_id, room_id);
        Some(LeaveEffect {
            roster: effect.roster,
            typing_stopped: effect.typing_stopped,
        })
    }

    /// 接続の痕跡を全ルームから取り除く（冪等）
    ///
    /// 影響を受けたルームごとに適用後ロスターと typing-stop の要否を
    /// 返す。既に切断済みの接続では空の結果を返し、二重ブロード
    /// キャストは起こらない。
    pub fn disconnect(&mut self, connection_id: &ConnectionId) -> DisconnectEffect {
        if self.sessions.remove(connection_id).is_none() {
            return DisconnectEffect::default();
        }
        self.active_room.remove(connection_id);

        let mut affected: Vec<RoomId> = self
            .live
            .iter()
            .filter(|(_, members)| members.contains_key(connection_id))
            .map(|(room_id, _)| room_id.clone())
            .collect();
        // typing だけ残っているルームも拾う（leave 後の取りこぼし対策）
        for (room_id, entries) in &self.typing {
            if !affected.contains(room_id) && entries.contains_key(connection_id) {
                affected.push(room_id.clone());
            }
        }
        // Sort by room id for consistent ordering
        affected.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        let rooms = affected
            .into_iter()
            .map(|room_id| {
                let effect = self.remove_live(connection_id, &room_id);
                AffectedRoom {
                    room_id,
                    roster: effect.roster,
                    typing_stopped: effect.typing_stopped,
                }
            })
            .collect();

        DisconnectEffect { rooms }
    }

    /// メッセージ適用: デフォルトルームならリングバッファへ追加し、
    /// 送信者のタイピング表示を消し、配信対象を返す
    ///
    /// 永続ルームのメッセージは Directory 側で永続化済みであること。
    pub fn apply_send(
        &mut self,
        connection_id: &ConnectionId,
        message: ChatMessage,
    ) -> SendEffect {
        let room_id = message.room_id.clone();
        if room_id.is_default() {
            self.lobby_history.push_back(message);
            while self.lobby_history.len() > LOBBY_HISTORY_CAP {
                self.lobby_history.pop_front();
            }
        }
        let typing_stopped = self.remove_typing(connection_id, &room_id);
        let targets = self
            .live
            .get(&room_id)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default();
        SendEffect {
            targets,
            typing_stopped,
        }
    }

    /// タイピング開始を記録し、通知対象（送信者以外）を返す
    ///
    /// ルームのライブメンバーでない接続からの信号は無視する。
    pub fn start_typing(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<TypingStart> {
        let username = self.sessions.get(connection_id)?.username.clone();
        let members = self.live.get(room_id)?;
        if !members.contains_key(connection_id) {
            return None;
        }
        let targets = members
            .keys()
            .filter(|id| *id != connection_id)
            .cloned()
            .collect();
        self.typing
            .entry(room_id.clone())
            .or_default()
            .insert(connection_id.clone(), username.clone());
        Some(TypingStart { username, targets })
    }

    /// タイピング表示を消し、通知対象（送信者以外）を返す
    ///
    /// エントリが無ければ None（冪等、通知も出さない）。
    pub fn stop_typing(
        &mut self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
    ) -> Option<Vec<ConnectionId>> {
        if !self.remove_typing(connection_id, room_id) {
            return None;
        }
        Some(
            self.live
                .get(room_id)
                .map(|members| {
                    members
                        .keys()
                        .filter(|id| *id != connection_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
        )
    }

    /// デフォルトルームの履歴スナップショット（時系列順）
    pub fn lobby_history(&self) -> Vec<ChatMessage> {
        self.lobby_history.iter().cloned().collect()
    }

    /// ライブ集合とタイピングマップから接続を取り除く共通処理
    fn remove_live(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> EvictedRoom {
        let roster = match self.live.get_mut(room_id) {
            Some(members) => {
                members.remove(connection_id);
                members.clone()
            }
            None => Roster::default(),
        };
        let typing_stopped = self.remove_typing(connection_id, room_id);
        EvictedRoom {
            room_id: room_id.clone(),
            roster,
            typing_stopped,
        }
    }

    fn remove_typing(&mut self, connection_id: &ConnectionId, room_id: &RoomId) -> bool {
        self.typing
            .get_mut(room_id)
            .is_some_and(|entries| entries.remove(connection_id).is_some())
    }
}
