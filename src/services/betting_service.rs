use crate::config::RewardPolicy;
use crate::error::{AppError, AppResult};
use crate::hackatime::HoursProvider;
use crate::models::{Bet, BetStatus, Currency, User};
use crate::repositories::bet_repository::NewBet;
use crate::repositories::{BetRepository, UserRepository};
use crate::services::ledger::CurrencyLedger;
use crate::services::saga::{Compensation, Compensator};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Hour goals a bet can be placed on, with their payout multipliers
pub fn bet_tiers() -> [(Decimal, Decimal); 4] {
    [
        (Decimal::from(5), Decimal::new(110, 2)),
        (Decimal::from(10), Decimal::new(125, 2)),
        (Decimal::from(20), Decimal::new(150, 2)),
        (Decimal::from(40), Decimal::new(200, 2)),
    ]
}

/// Multiplier for an hour goal, if the goal is one of the tiers
pub fn bet_multiplier(hours_goal: Decimal) -> Option<Decimal> {
    bet_tiers()
        .into_iter()
        .find(|(goal, _)| *goal == hours_goal)
        .map(|(_, multiplier)| multiplier)
}

/// Status a bet should have at `now` given the hours worked so far.
///
/// Never moves a bet backwards: terminal states stay put, and a bet already
/// marked won counts as having met its goal.
pub fn determine_bet_status(bet: &Bet, hours_worked: Decimal, now: DateTime<Utc>) -> BetStatus {
    if bet.status.is_terminal() {
        return bet.status;
    }
    if now < bet.end_date {
        return BetStatus::Active;
    }

    let goal_met = bet.status == BetStatus::Won || hours_worked >= bet.hours_goal;
    if now >= bet.expiry_date {
        if goal_met {
            BetStatus::Expired
        } else {
            BetStatus::Lost
        }
    } else if goal_met {
        BetStatus::Won
    } else {
        BetStatus::Lost
    }
}

/// Whether deciding the bet's status at `now` depends on tracked hours
pub fn needs_hours(bet: &Bet, now: DateTime<Utc>) -> bool {
    !bet.status.is_terminal() && bet.status != BetStatus::Won && now >= bet.end_date
}

#[derive(Debug, Clone)]
pub struct ClaimResult {
    pub bet: Bet,
    pub coins_earned: i64,
}

/// Time-boxed wagers on hours worked
pub struct BettingService {
    bet_repo: Arc<BetRepository>,
    user_repo: Arc<UserRepository>,
    ledger: Arc<CurrencyLedger>,
    compensator: Arc<Compensator>,
    hours: Arc<dyn HoursProvider>,
    policy: RewardPolicy,
}

impl BettingService {
    pub fn new(
        bet_repo: Arc<BetRepository>,
        user_repo: Arc<UserRepository>,
        ledger: Arc<CurrencyLedger>,
        compensator: Arc<Compensator>,
        hours: Arc<dyn HoursProvider>,
        policy: RewardPolicy,
    ) -> Self {
        Self {
            bet_repo,
            user_repo,
            ledger,
            compensator,
            hours,
            policy,
        }
    }

    async fn load_user(&self, user_id: &str) -> AppResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    /// Hours tracked between the bet start and `min(now, end)`
    async fn hours_worked(&self, user: &User, bet: &Bet, now: DateTime<Utc>) -> AppResult<Decimal> {
        let Some(email) = user.email.as_deref() else {
            warn!("User {} has no email, counting 0 tracked hours", user.id);
            return Ok(Decimal::ZERO);
        };
        let end = now.min(bet.end_date);
        if end <= bet.start_date {
            return Ok(Decimal::ZERO);
        }
        self.hours.hours_between(email, bet.start_date, end).await
    }

    /// Open a new bet. The bet is written before the coins are debited and
    /// deleted again if the debit fails.
    pub async fn place_bet(
        &self,
        user_id: &str,
        amount: i64,
        hours_goal: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Bet> {
        info!(
            "Placing bet: user={}, amount={}, goal={}h",
            user_id, amount, hours_goal
        );

        if amount < self.policy.bet_min_amount || amount > self.policy.bet_max_amount {
            return Err(AppError::Validation(format!(
                "Bet amount must be between {} and {}",
                self.policy.bet_min_amount, self.policy.bet_max_amount
            )));
        }
        let multiplier = bet_multiplier(hours_goal).ok_or_else(|| {
            AppError::Validation(format!("No bet tier for a {} hour goal", hours_goal))
        })?;

        let user = self.load_user(user_id).await?;
        if user.coins < amount {
            return Err(AppError::InsufficientFunds {
                currency: Currency::Coins.as_str(),
                required: amount,
                available: user.coins,
            });
        }

        let existing = self.bet_repo.find_by_user(user_id).await?;
        if existing
            .iter()
            .any(|b| b.status == BetStatus::Active && now < b.end_date)
        {
            return Err(AppError::Conflict("You already have an active bet".into()));
        }

        let end_date = now + Duration::days(self.policy.bet_duration_days);
        let expiry_date = end_date + Duration::days(self.policy.bet_claim_window_days);

        let mut saga = self.compensator.begin("place_bet");
        let bet = saga
            .step(
                self.bet_repo.create(NewBet {
                    user_id,
                    amount,
                    hours_goal,
                    multiplier,
                    start_date: now,
                    end_date,
                    expiry_date,
                }),
                |b| Compensation::DeleteBet {
                    bet_id: b.id.clone(),
                },
            )
            .await?;

        saga.finish(self.ledger.debit(user_id, Currency::Coins, amount, "bet placed"))
            .await?;

        info!("Bet {} placed by {} ({}x)", bet.id, user_id, multiplier);
        Ok(bet)
    }

    /// Claim a won bet
    pub async fn claim_bet(
        &self,
        user_id: &str,
        bet_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<ClaimResult> {
        let user = self.load_user(user_id).await?;

        let bet = self
            .bet_repo
            .find_by_id(bet_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bet not found".into()))?;
        if bet.user_id != user.id {
            return Err(AppError::Forbidden("This bet belongs to another user".into()));
        }
        if bet.status == BetStatus::Claimed {
            return Err(AppError::Conflict("Bet has already been claimed".into()));
        }

        let hours = if needs_hours(&bet, now) {
            self.hours_worked(&user, &bet, now).await?
        } else {
            Decimal::ZERO
        };
        let status = determine_bet_status(&bet, hours, now);

        if status != BetStatus::Won {
            if status != bet.status {
                self.bet_repo.update_status(&bet.id, status).await?;
            }
            return Err(AppError::Conflict(format!(
                "Bet is {} and cannot be claimed",
                status.as_str()
            )));
        }

        let coins = bet.payout();

        let mut saga = self.compensator.begin("claim_bet");
        let claimed = saga
            .step(self.bet_repo.mark_claimed(&bet.id, coins, now), |b| {
                Compensation::RevertBetClaim {
                    bet_id: b.id.clone(),
                }
            })
            .await?;

        if coins > 0 {
            saga.finish(self.ledger.credit(user_id, Currency::Coins, coins, "bet won"))
                .await?;
        }

        info!("Bet {} claimed by {}: {} coins", bet.id, user_id, coins);
        Ok(ClaimResult {
            bet: claimed,
            coins_earned: coins,
        })
    }

    /// A user's bets with derived status transitions persisted
    pub async fn list_bets(&self, user_id: &str, now: DateTime<Utc>) -> AppResult<Vec<Bet>> {
        let user = self.load_user(user_id).await?;
        let bets = self.bet_repo.find_by_user(user_id).await?;

        let refreshed = join_all(bets.into_iter().map(|bet| self.refresh(&user, bet, now))).await;
        let mut bets = refreshed.into_iter().collect::<AppResult<Vec<_>>>()?;
        bets.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(bets)
    }

    async fn refresh(&self, user: &User, bet: Bet, now: DateTime<Utc>) -> AppResult<Bet> {
        if bet.status.is_terminal() || now < bet.end_date {
            return Ok(bet);
        }

        let hours = if needs_hours(&bet, now) {
            match self.hours_worked(user, &bet, now).await {
                Ok(hours) => hours,
                Err(e) => {
                    warn!("Could not refresh bet {}: {}", bet.id, e);
                    return Ok(bet);
                }
            }
        } else {
            Decimal::ZERO
        };

        let status = determine_bet_status(&bet, hours, now);
        if status == bet.status {
            return Ok(bet);
        }

        info!(
            "Bet {}: {} -> {}",
            bet.id,
            bet.status.as_str(),
            status.as_str()
        );
        Ok(self.bet_repo.update_status(&bet.id, status).await?)
    }
}
