use crate::block::BasicBlock;
use crate::condition::Condition;
use crate::decoration::Decorations;
use crate::instruction::{Instruction, InstructionMeta, NopReason};
use crate::literal::Literal;
use crate::method::{Method, ParameterDecorations};
use crate::module::{Global, Module};
use crate::opcode::OpCode;
use crate::pack::PackMode;
use crate::types::{AddressSpace, DataType, ScalarType};
use crate::value::Value;
use crate::walker::InstructionWalker;

fn i32_ty() -> DataType {
    DataType::Scalar(ScalarType::I32)
}

#[test]
fn basic_block_preserves_order_across_middle_insertion() {
    let mut block = BasicBlock::new("entry");
    let first = block.push_back(Instruction::Nop(NopReason::Other("a")));
    let last = block.push_back(Instruction::Nop(NopReason::Other("c")));
    block.insert_before(last, Instruction::Nop(NopReason::Other("b")));

    let reasons: Vec<_> = block
        .iter()
        .map(|(_, ins)| match ins {
            Instruction::Nop(NopReason::Other(tag)) => *tag,
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(reasons, vec!["a", "b", "c"]);
    assert_eq!(block.first_key(), Some(first));
    assert_eq!(block.last_key(), Some(last));
}

#[test]
fn basic_block_remove_returns_successor_key() {
    let mut block = BasicBlock::new("entry");
    let a = block.push_back(Instruction::Nop(NopReason::Other("a")));
    let b = block.push_back(Instruction::Nop(NopReason::Other("b")));

    let (removed, next) = block.remove(a);
    assert!(matches!(removed, Instruction::Nop(NopReason::Other("a"))));
    assert_eq!(next, Some(b));
    assert_eq!(block.first_key(), Some(b));
}

#[test]
fn method_add_new_local_disambiguates_repeated_prefixes() {
    let mut method = Method::new("test_kernel", true);
    let a = method.add_new_local(i32_ty(), "tmp");
    let b = method.add_new_local(i32_ty(), "tmp");
    assert_ne!(a, b);
    assert_eq!(method.local(a).unwrap().name, "%tmp.0");
    assert_eq!(method.local(b).unwrap().name, "%tmp.1");
}

#[test]
fn walker_emplace_pushes_existing_instruction_forward() {
    let mut method = Method::new("test_kernel", true);
    let entry = method.entry_block_index();
    {
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Return);
    }
    assert_eq!(method.block(entry).len(), 1);

    let first_key = method.block(entry).first_key().unwrap();
    {
        let mut walker = InstructionWalker::at(&mut method, entry, first_key);
        walker.emplace(Instruction::Nop(NopReason::Other("inserted")));
    }

    let ordered: Vec<_> = method
        .block(entry)
        .iter()
        .map(|(_, ins)| matches!(ins, Instruction::Return))
        .collect();
    assert_eq!(ordered, vec![false, true]);
}

#[test]
fn walker_erase_updates_use_def_sets() {
    let mut method = Method::new("test_kernel", true);
    let local = method.add_new_local(i32_ty(), "x");
    let entry = method.entry_block_index();

    let key = {
        let mut walker = InstructionWalker::at_block_start(&mut method, entry);
        walker.emplace(Instruction::Move {
            src: Value::int(1, i32_ty()),
            dest: Value::Local(local, i32_ty()),
            meta: InstructionMeta::default(),
        });
        walker.key().unwrap()
    };

    assert!(method.local(local).unwrap().writers().any(|k| k == key));

    {
        let mut walker = InstructionWalker::at(&mut method, entry, key);
        walker.erase();
    }
    assert_eq!(method.local(local).unwrap().writers().count(), 0);
}

#[test]
fn walker_next_crosses_block_boundary() {
    let mut method = Method::new("test_kernel", true);
    let entry = method.entry_block_index();
    let second = method.add_block("next");
    method.block_mut(entry).push_back(Instruction::Nop(NopReason::Other("only-in-entry")));
    method.block_mut(second).push_back(Instruction::Return);

    let mut walker = InstructionWalker::at_block_start(&mut method, entry);
    assert!(walker.get().is_some());
    assert!(!walker.next_in_block());
    assert!(walker.next());
    assert_eq!(walker.block_index(), second);
    assert!(matches!(walker.get(), Some(Instruction::Return)));
}

#[test]
fn opcode_precalculate_folds_constant_add() {
    let result = OpCode::Add.precalculate(&[Literal::Int(2), Literal::Int(3)]);
    assert_eq!(result, Some(Literal::Int(5)));
}

#[test]
fn opcode_precalculate_rejects_wrong_arity() {
    assert_eq!(OpCode::Add.precalculate(&[Literal::Int(2)]), None);
}

#[test]
fn pack_mode_for_saturating_store_matches_signedness() {
    assert_eq!(PackMode::for_saturating_store(8, true), PackMode::Int8Saturate);
    assert_eq!(PackMode::for_saturating_store(8, false), PackMode::UInt8Saturate);
    assert_eq!(PackMode::for_saturating_store(16, false), PackMode::UInt16Truncate);
}

#[test]
fn condition_invert_is_involutive() {
    for cond in [
        Condition::Always,
        Condition::ZeroSet,
        Condition::ZeroClear,
        Condition::NegativeSet,
        Condition::NegativeClear,
        Condition::CarrySet,
        Condition::CarryClear,
    ] {
        assert_eq!(cond.invert().invert(), cond);
    }
}

#[test]
fn struct_layout_accounts_for_alignment_padding() {
    let ty = DataType::Struct {
        fields: vec![DataType::Scalar(ScalarType::U8), DataType::Scalar(ScalarType::I32)],
        alignment: 4,
    };
    assert_eq!(ty.physical_width(), 8);
}

#[test]
fn module_global_pointer_type_uses_global_address_space() {
    let mut module = Module::new();
    module.globals.push(Global::new(
        "table",
        i32_ty(),
        4,
        Value::Undefined(i32_ty()),
    ));
    let global = module.find_global("table").unwrap();
    match global.pointer_type() {
        DataType::Pointer { address_space, .. } => assert_eq!(address_space, AddressSpace::Global),
        _ => panic!("expected pointer type"),
    }
}

#[test]
fn parameter_decorations_compose() {
    let flags = ParameterDecorations::READ_ONLY | ParameterDecorations::RESTRICT;
    assert!(flags.contains(ParameterDecorations::READ_ONLY));
    assert!(!flags.contains(ParameterDecorations::VOLATILE));
}

#[test]
fn decorations_default_is_empty() {
    let decorations = Decorations::default();
    assert!(decorations.is_empty());
}
