//! Main processor for the engine account
//!
//! Routes instructions to their handlers and screens inbound token
//! transfers into deposits and repayments.

use borsh::BorshDeserialize;
use tracing::debug;

use crate::asset::AccountId;
use crate::borrowing::{DepositOutcome, RepayOutcome};
use crate::engine::LendingEngine;
use crate::error::LendingError;
use crate::instruction::LendingInstruction;
use crate::transfer::{AssetKind, AssetTransferPort, TransferNotice};

/// What the transfer screen did with an inbound transfer
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TransferOutcome {
    /// Not addressed to the engine, sent by the engine itself, or token
    /// float moved by the stable contract
    Ignored,
    Deposited(DepositOutcome),
    Repaid(RepayOutcome),
}

/// Decode a serialized instruction and run it.
pub fn dispatch<P: AssetTransferPort>(
    engine: &mut LendingEngine<P>,
    caller: &AccountId,
    instruction_data: &[u8],
    now: i64,
) -> Result<(), LendingError> {
    let instruction = LendingInstruction::try_from_slice(instruction_data)
        .map_err(|_| LendingError::InvalidInstruction)?;
    handle_instruction(engine, caller, instruction, now)
}

/// Route one decoded instruction to its handler.
pub fn handle_instruction<P: AssetTransferPort>(
    engine: &mut LendingEngine<P>,
    caller: &AccountId,
    instruction: LendingInstruction,
    now: i64,
) -> Result<(), LendingError> {
    debug!("Instruction from {}: {:?}", caller, instruction);

    match instruction {
        // === Registry Instructions ===
        LendingInstruction::SetParam { key, value } => engine.set_param(caller, &key, &value),

        LendingInstruction::AddCollateral { symbol, contract } => {
            engine.add_collateral(caller, symbol, contract)
        }

        LendingInstruction::SetCollateralActive { code, active } => {
            engine.set_collateral_active(caller, &code, active)
        }

        LendingInstruction::RemoveCollateral { code } => engine.remove_collateral(caller, &code),

        // === Oracle Instructions ===
        LendingInstruction::AddOracle { account, symbols } => {
            engine.add_oracle(caller, &account, symbols)
        }

        LendingInstruction::SetOracle { account, symbols } => {
            engine.set_oracle(caller, &account, symbols)
        }

        LendingInstruction::RemoveOracle { account } => engine.remove_oracle(caller, &account),

        LendingInstruction::SubmitRate { oracle, code, price } => {
            engine.submit_rate(caller, &oracle, &code, price)
        }

        // === Position Instructions ===
        LendingInstruction::SetInterestRate { user, code, rate } => {
            engine.set_interest_rate(caller, &user, &code, rate)
        }

        LendingInstruction::AccrueInterest { user, code } => {
            engine.accrue_interest(caller, &user, &code, now).map(|_| ())
        }

        LendingInstruction::Liquidate { user, code } => {
            engine.liquidate(caller, &user, &code).map(|_| ())
        }
    }
}

/// Screen an inbound transfer and route it.
///
/// Transfers not addressed to the engine, sent by the engine itself, or
/// moved by the stable token contract pass through untouched. Stable
/// inflows repay the position the memo names; anything else is offered
/// as a collateral deposit.
pub fn handle_transfer<P: AssetTransferPort>(
    engine: &mut LendingEngine<P>,
    notice: &TransferNotice,
    now: i64,
) -> Result<TransferOutcome, LendingError> {
    let engine_account = engine.config().engine_account.clone();
    if notice.from == engine_account || notice.to != engine_account {
        return Ok(TransferOutcome::Ignored);
    }

    match engine.config().classify(&notice.contract, &notice.quantity.symbol) {
        AssetKind::Stable => {
            if notice.from == engine.config().stable_contract {
                debug!("Stable contract moved {} of its own float", notice.quantity);
                return Ok(TransferOutcome::Ignored);
            }
            engine
                .repay(&notice.from, &notice.memo, notice.quantity.amount)
                .map(TransferOutcome::Repaid)
        }
        AssetKind::Collateral(code) => engine
            .deposit(&notice.from, &code, notice.quantity.amount, now)
            .map(TransferOutcome::Deposited),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{Asset, Symbol, SymbolCode};
    use crate::constants::{
        PARAM_INTEREST_DEF, PARAM_INTEREST_INTERVAL, PARAM_MAX_ORACLES, PARAM_POSITION_DEF,
    };
    use crate::engine::EngineConfig;
    use crate::transfer::MemoryTokenLedger;
    use borsh::BorshSerialize;

    fn acct(name: &str) -> AccountId {
        AccountId::new(name)
    }

    fn code(s: &str) -> SymbolCode {
        SymbolCode::new(s).unwrap()
    }

    fn eos() -> Symbol {
        Symbol::new("EOS", 4).unwrap()
    }

    fn zig() -> Symbol {
        Symbol::new("ZIG", 4).unwrap()
    }

    fn ready_engine() -> LendingEngine<MemoryTokenLedger> {
        let mut port = MemoryTokenLedger::new();
        port.create_token(acct("zig.token"), code("ZIG"));
        port.create_token(acct("eosio.token"), code("EOS"));
        port.register_account(acct("oracle1"));
        port.issue_to(&acct("zig.token"), &acct("lending"), &Asset::new(10_000_000, zig()));
        port.issue_to(&acct("eosio.token"), &acct("lending"), &Asset::new(10_000_000, eos()));

        let mut engine = LendingEngine::new(
            EngineConfig {
                admin: acct("lending"),
                engine_account: acct("lending"),
                stable: zig(),
                stable_contract: acct("zig.token"),
                default_collateral: code("EOS"),
            },
            port,
        );
        let admin = acct("lending");
        engine.set_param(&admin, PARAM_MAX_ORACLES, "5").unwrap();
        engine.set_param(&admin, PARAM_POSITION_DEF, "2").unwrap();
        engine.set_param(&admin, PARAM_INTEREST_DEF, "0.01").unwrap();
        engine.set_param(&admin, PARAM_INTEREST_INTERVAL, "86400").unwrap();
        engine.add_collateral(&admin, eos(), acct("eosio.token")).unwrap();
        engine.set_collateral_active(&admin, &code("EOS"), true).unwrap();
        engine.add_oracle(&admin, &acct("oracle1"), vec![code("EOS")]).unwrap();
        engine
            .submit_rate(&acct("oracle1"), &acct("oracle1"), &code("EOS"), "3".parse().unwrap())
            .unwrap();
        engine
    }

    fn inbound(contract: &str, from: &str, quantity: Asset, memo: &str) -> TransferNotice {
        TransferNotice {
            contract: acct(contract),
            from: acct(from),
            to: acct("lending"),
            quantity,
            memo: memo.to_string(),
        }
    }

    #[test]
    fn dispatch_decodes_and_routes() {
        let mut engine = ready_engine();
        let admin = acct("lending");

        let bytes = LendingInstruction::SetParam {
            key: "penalty".to_string(),
            value: "0.1".to_string(),
        }
        .try_to_vec()
        .unwrap();
        dispatch(&mut engine, &admin, &bytes, 0).unwrap();
        assert_eq!(engine.ledger().params.get("penalty"), Some("0.1"));

        assert_eq!(
            dispatch(&mut engine, &admin, &[255, 7, 7], 0),
            Err(LendingError::InvalidInstruction)
        );
    }

    #[test]
    fn instructions_thread_the_caller() {
        let mut engine = ready_engine();

        // oracle identity comes from the caller, not just the payload
        let submit = LendingInstruction::SubmitRate {
            oracle: acct("oracle1"),
            code: code("EOS"),
            price: "4".parse().unwrap(),
        };
        assert_eq!(
            handle_instruction(&mut engine, &acct("mallory"), submit.clone(), 0),
            Err(LendingError::Unauthorized)
        );
        handle_instruction(&mut engine, &acct("oracle1"), submit, 0).unwrap();
        assert_eq!(engine.mean_price(&code("EOS")).unwrap(), "4".parse().unwrap());
    }

    #[test]
    fn transfers_not_for_the_engine_pass_through() {
        let mut engine = ready_engine();

        let mut sideways = inbound("eosio.token", "alice", Asset::new(5_000, eos()), "");
        sideways.to = acct("bob");
        assert_eq!(handle_transfer(&mut engine, &sideways, 100), Ok(TransferOutcome::Ignored));

        // the engine's own disbursements echo back as notices
        let own = inbound("zig.token", "lending", Asset::new(1_500, zig()), "");
        assert_eq!(handle_transfer(&mut engine, &own, 100), Ok(TransferOutcome::Ignored));

        assert!(engine.ledger().position(&code("EOS"), &acct("alice")).is_none());
    }

    #[test]
    fn collateral_inflow_opens_a_position() {
        let mut engine = ready_engine();

        let outcome = handle_transfer(
            &mut engine,
            &inbound("eosio.token", "alice", Asset::new(1_000, eos()), ""),
            100,
        )
        .unwrap();

        assert_eq!(
            outcome,
            TransferOutcome::Deposited(DepositOutcome::Accepted { borrowed_delta: 1_500 })
        );
        assert!(engine.ledger().position(&code("EOS"), &acct("alice")).is_some());
    }

    #[test]
    fn stable_inflow_repays_the_named_position() {
        let mut engine = ready_engine();
        handle_transfer(
            &mut engine,
            &inbound("eosio.token", "alice", Asset::new(1_000, eos()), ""),
            100,
        )
        .unwrap();

        let outcome = handle_transfer(
            &mut engine,
            &inbound("zig.token", "alice", Asset::new(1_515, zig()), "EOS"),
            200,
        )
        .unwrap();

        assert_eq!(outcome, TransferOutcome::Repaid(RepayOutcome::Closed));
        assert!(engine.ledger().position(&code("EOS"), &acct("alice")).is_none());
    }

    #[test]
    fn stable_contract_float_is_ignored() {
        let mut engine = ready_engine();

        let float = inbound("zig.token", "zig.token", Asset::new(9_999, zig()), "EOS");
        assert_eq!(handle_transfer(&mut engine, &float, 100), Ok(TransferOutcome::Ignored));
    }

    #[test]
    fn stable_symbol_on_another_contract_is_collateral() {
        let mut engine = ready_engine();

        // an imitation ZIG goes down the deposit path and is unknown there
        let fake = inbound("fake.token", "alice", Asset::new(5_000, zig()), "");
        assert_eq!(
            handle_transfer(&mut engine, &fake, 100),
            Ok(TransferOutcome::Deposited(DepositOutcome::Ignored))
        );
    }
}
