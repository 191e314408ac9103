//! The allocator linked into every program that builds records.
//!
//! A first-fit free list with bump allocation from `$heap-memory`, the last
//! data label of the program. Each block carries its payload size in the
//! word just before the returned pointer. Freed blocks are linked through
//! their first word; the rest of the record (including its status word, and
//! so its deleted bit) is left as it was.
//!
//! Both routines are leaves and keep their return address in their own cell.

use crate::asm::{Fragment, Instruction::*};

/// `[size] -> [pointer]`
pub const ALLOCATE: &str = "-mem-manager-allocate";
/// `[pointer] -> []`
pub const DEALLOCATE: &str = "-mem-manager-deallocate";
/// First byte past the program's data.
pub const HEAP_MEMORY: &str = "$heap-memory";

const FREE_LIST: &str = "$mmgr-free-list";
const BUMP_POINTER: &str = "$mmgr-bump-pointer";
const ALLOCATE_RETURN: &str = "$mmgr-alloc-return";
const ALLOCATE_SIZE: &str = "$mmgr-alloc-size";
const ALLOCATE_PREVIOUS: &str = "$mmgr-alloc-previous";
const ALLOCATE_CURRENT: &str = "$mmgr-alloc-current";
const DEALLOCATE_RETURN: &str = "$mmgr-dealloc-return";

const SEARCH: &str = "-mem-manager-alloc-search";
const NEXT: &str = "-mem-manager-alloc-next";
const UNLINK_HEAD: &str = "-mem-manager-alloc-unlink-head";
const FOUND: &str = "-mem-manager-alloc-found";
const BUMP: &str = "-mem-manager-alloc-bump";
const EXIT: &str = "-mem-manager-alloc-exit";

/// Runs before anything else: points the bump allocator at the heap.
pub fn initialization() -> Fragment {
    let mut code = Fragment::void();
    code.extend([PushD(BUMP_POINTER.into()), PushD(HEAP_MEMORY.into()), StoreI]);
    code
}

/// The allocator routines and their cells, ending with the heap label.
pub fn epilogue() -> Fragment {
    let mut code = Fragment::void();
    for cell in [
        FREE_LIST,
        BUMP_POINTER,
        ALLOCATE_RETURN,
        ALLOCATE_SIZE,
        ALLOCATE_PREVIOUS,
        ALLOCATE_CURRENT,
        DEALLOCATE_RETURN,
    ] {
        code.extend([DLabel(cell.into()), DataI(0)]);
    }
    code.append(allocate());
    code.append(deallocate());
    code.emit(DLabel(HEAP_MEMORY.into()));
    code
}

fn allocate() -> Fragment {
    let mut code = Fragment::void();
    code.emit(Label(ALLOCATE.into()));
    code.store_i(ALLOCATE_RETURN);
    code.store_i(ALLOCATE_SIZE);

    // First fit over the free list.
    code.emit(PushI(0));
    code.store_i(ALLOCATE_PREVIOUS);
    code.load_i(FREE_LIST);
    code.store_i(ALLOCATE_CURRENT);

    code.emit(Label(SEARCH.into()));
    code.load_i(ALLOCATE_CURRENT);
    code.emit(JumpFalse(BUMP.into()));
    code.load_i(ALLOCATE_CURRENT);
    code.extend([PushI(4), Subtract, LoadI]);
    code.load_i(ALLOCATE_SIZE);
    code.extend([Subtract, JumpNeg(NEXT.into())]);

    code.load_i(ALLOCATE_PREVIOUS);
    code.emit(JumpFalse(UNLINK_HEAD.into()));
    code.load_i(ALLOCATE_PREVIOUS);
    code.load_i(ALLOCATE_CURRENT);
    code.extend([LoadI, StoreI, Jump(FOUND.into())]);

    code.emit(Label(UNLINK_HEAD.into()));
    code.emit(PushD(FREE_LIST.into()));
    code.load_i(ALLOCATE_CURRENT);
    code.extend([LoadI, StoreI]);

    code.emit(Label(FOUND.into()));
    code.load_i(ALLOCATE_CURRENT);
    code.emit(Jump(EXIT.into()));

    code.emit(Label(NEXT.into()));
    code.load_i(ALLOCATE_CURRENT);
    code.store_i(ALLOCATE_PREVIOUS);
    code.load_i(ALLOCATE_CURRENT);
    code.emit(LoadI);
    code.store_i(ALLOCATE_CURRENT);
    code.emit(Jump(SEARCH.into()));

    // Nothing fits: carve a new block off the heap.
    code.emit(Label(BUMP.into()));
    code.load_i(BUMP_POINTER);
    code.add_offset(4);
    code.load_i(BUMP_POINTER);
    code.load_i(ALLOCATE_SIZE);
    code.emit(StoreI);
    code.emit(Duplicate);
    code.load_i(ALLOCATE_SIZE);
    code.emit(Add);
    code.store_i(BUMP_POINTER);

    code.emit(Label(EXIT.into()));
    code.load_i(ALLOCATE_RETURN);
    code.emit(PopPC);
    code
}

fn deallocate() -> Fragment {
    let mut code = Fragment::void();
    code.emit(Label(DEALLOCATE.into()));
    code.store_i(DEALLOCATE_RETURN);
    code.emit(Duplicate);
    code.load_i(FREE_LIST);
    code.emit(StoreI);
    code.store_i(FREE_LIST);
    code.load_i(DEALLOCATE_RETURN);
    code.emit(PopPC);
    code
}
