//! Kanban board state and the stage reassignment transform applied when a
//! deal card is dropped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::deals::{BoardResponse, DealResponse};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealCard {
    pub id: Uuid,
    pub title: String,
    pub value_cents: i64,
}

impl From<DealResponse> for DealCard {
    fn from(deal: DealResponse) -> Self {
        Self {
            id: deal.id,
            title: deal.title,
            value_cents: deal.value_cents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub stage_id: Uuid,
    pub name: String,
    pub deals: Vec<DealCard>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub pipeline_id: Uuid,
    pub columns: Vec<BoardColumn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Dropped on a column body: the card goes last.
    Stage(Uuid),
    /// Dropped on another card: the card takes that card's slot.
    Deal(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMove {
    pub deal_id: Uuid,
    pub from_stage: Uuid,
    pub to_stage: Uuid,
    pub position: usize,
}

impl StageMove {
    #[must_use]
    pub fn changes_stage(&self) -> bool {
        self.from_stage != self.to_stage
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    UnknownDeal(Uuid),
    UnknownStage(Uuid),
}

impl std::fmt::Display for BoardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownDeal(id) => write!(f, "unknown deal: {id}"),
            Self::UnknownStage(id) => write!(f, "unknown stage: {id}"),
        }
    }
}

impl std::error::Error for BoardError {}

impl From<BoardResponse> for Board {
    fn from(response: BoardResponse) -> Self {
        let mut stages = response.stages;
        stages.sort_by_key(|stage| stage.position);
        Self {
            pipeline_id: response.pipeline_id,
            columns: stages
                .into_iter()
                .map(|stage| {
                    let mut deals = stage.deals;
                    deals.sort_by_key(|deal| deal.position);
                    BoardColumn {
                        stage_id: stage.stage_id,
                        name: stage.name,
                        deals: deals.into_iter().map(DealCard::from).collect(),
                    }
                })
                .collect(),
        }
    }
}

impl Board {
    /// Column and row of a card.
    #[must_use]
    pub fn locate(&self, deal_id: Uuid) -> Option<(usize, usize)> {
        self.columns.iter().enumerate().find_map(|(col, column)| {
            column
                .deals
                .iter()
                .position(|deal| deal.id == deal_id)
                .map(|row| (col, row))
        })
    }

    fn column_index(&self, stage_id: Uuid) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.stage_id == stage_id)
    }

    /// Moves a card and reports where it landed, or `None` when the drop
    /// leaves the board unchanged.
    ///
    /// Within one column the card takes the slot of the card it was dropped
    /// on (array-move semantics); across columns it is inserted before it.
    pub fn move_deal(
        &mut self,
        deal_id: Uuid,
        target: DropTarget,
    ) -> Result<Option<StageMove>, BoardError> {
        let (from_col, from_row) = self
            .locate(deal_id)
            .ok_or(BoardError::UnknownDeal(deal_id))?;

        let (to_col, to_row) = match target {
            DropTarget::Deal(over) if over == deal_id => return Ok(None),
            DropTarget::Deal(over) => self.locate(over).ok_or(BoardError::UnknownDeal(over))?,
            DropTarget::Stage(stage_id) => {
                let col = self
                    .column_index(stage_id)
                    .ok_or(BoardError::UnknownStage(stage_id))?;
                let len = self.columns[col].deals.len();
                let row = if col == from_col { len - 1 } else { len };
                (col, row)
            }
        };

        if to_col == from_col && to_row == from_row {
            return Ok(None);
        }

        let card = self.columns[from_col].deals.remove(from_row);
        let column = &mut self.columns[to_col];
        let position = to_row.min(column.deals.len());
        column.deals.insert(position, card);

        let stage_move = StageMove {
            deal_id,
            from_stage: self.columns[from_col].stage_id,
            to_stage: self.columns[to_col].stage_id,
            position,
        };
        tracing::debug!(
            event = "board_deal_moved",
            deal_id = %deal_id,
            from_stage = %stage_move.from_stage,
            to_stage = %stage_move.to_stage,
            position = position,
        );
        Ok(Some(stage_move))
    }
}
