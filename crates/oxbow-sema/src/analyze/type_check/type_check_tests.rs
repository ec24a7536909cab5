use crate::Session;
use crate::diagnostics::DiagnosticKind;
use crate::ir::{NodeId, NodeKind, PermKind};

fn error_kinds(sess: &Session) -> Vec<DiagnosticKind> {
    sess.diag.iter().map(|d| d.kind()).collect()
}

/// fn mul(a i32, b i32) i32
/// fn sq(x i32) i32 { return mul(x, x) }
#[test]
fn s1_simple_function() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let mul = b.name("mul");
    let sq = b.name("sq");
    let a = b.name("a");
    let x = b.name("x");

    let mul_a = b.parm(a, builtins.i32);
    let mul_b = {
        let bn = b.name("b");
        b.parm(bn, builtins.i32)
    };
    let mul_sig = b.fn_sig(vec![mul_a, mul_b], builtins.i32);
    let mul_dcl = b.fn_dcl(mul, mul_sig, None);

    let sq_parm = b.parm(x, builtins.i32);
    let sq_sig = b.fn_sig(vec![sq_parm], builtins.i32);
    let use_mul = b.name_use(mul);
    let x1 = b.name_use(x);
    let x2 = b.name_use(x);
    let product = b.fn_call(use_mul, vec![x1, x2]);
    let ret = b.return_node(Some(product));
    let body = b.block(vec![ret]);
    let sq_dcl = b.fn_dcl(sq, sq_sig, Some(body));

    let module = b.module(vec![mul_dcl, sq_dcl]);
    sess.analyze(module).expect("clean analysis");

    // The multiply node and the returned expression are both i32.
    assert_eq!(sess.arena.vtype(product), builtins.i32);
    match sess.arena.kind(ret) {
        NodeKind::Return { exp: Some(exp), .. } => {
            assert_eq!(sess.arena.vtype(*exp), builtins.i32);
        }
        _ => panic!("expected a return with a value"),
    }
}

fn declare_add_overloads(sess: &mut Session) -> (NodeId, NodeId) {
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let add = b.name("add");
    let a = b.name("a");
    let b_name = b.name("b");

    let p1 = b.parm(a, builtins.i32);
    let p2 = b.parm(b_name, builtins.i32);
    let sig_int = b.fn_sig(vec![p1, p2], builtins.i32);
    let add_int = b.fn_dcl(add, sig_int, None);

    let p3 = b.parm(a, builtins.f32);
    let p4 = b.parm(b_name, builtins.f32);
    let sig_float = b.fn_sig(vec![p3, p4], builtins.f32);
    let add_float = b.fn_dcl(add, sig_float, None);

    (add_int, add_float)
}

fn call_add_in_fn(
    sess: &mut Session,
    fn_name: &str,
    rettype: NodeId,
    args: Vec<NodeId>,
) -> (NodeId, NodeId) {
    let mut b = sess.builder();
    let name = b.name(fn_name);
    let add = b.name("add");
    let sig = b.fn_sig(vec![], rettype);
    let callee = b.name_use(add);
    let call = b.fn_call(callee, args);
    let ret = b.return_node(Some(call));
    let body = b.block(vec![ret]);
    let dcl = b.fn_dcl(name, sig, Some(body));
    (dcl, callee)
}

/// add(1, 2) picks the integer overload; add(1.0, 2.0) the float one.
#[test]
fn s2_overload_resolution() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let (add_int, add_float) = declare_add_overloads(&mut sess);

    let mut b = sess.builder();
    let one = b.ulit(1, builtins.i32);
    let two = b.ulit(2, builtins.i32);
    let (int_caller, int_callee) = call_add_in_fn(&mut sess, "ci", builtins.i32, vec![one, two]);

    let mut b = sess.builder();
    let fone = b.flit(1.0, builtins.f32);
    let ftwo = b.flit(2.0, builtins.f32);
    let (float_caller, float_callee) =
        call_add_in_fn(&mut sess, "cf", builtins.f32, vec![fone, ftwo]);

    let mut b = sess.builder();
    let module = b.module(vec![add_int, add_float, int_caller, float_caller]);
    sess.analyze(module).expect("clean analysis");

    match sess.arena.kind(int_callee) {
        NodeKind::NameUse { dcl, .. } => assert_eq!(*dcl, Some(add_int)),
        _ => unreachable!(),
    }
    match sess.arena.kind(float_callee) {
        NodeKind::NameUse { dcl, .. } => assert_eq!(*dcl, Some(add_float)),
        _ => unreachable!(),
    }
}

/// add(1, 2.0) matches neither overload.
#[test]
fn s2_overload_mismatch_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let (add_int, add_float) = declare_add_overloads(&mut sess);

    let mut b = sess.builder();
    let one = b.ulit(1, builtins.i32);
    let ftwo = b.flit(2.0, builtins.f32);
    let (caller, _) = call_add_in_fn(&mut sess, "cm", builtins.i32, vec![one, ftwo]);

    let mut b = sess.builder();
    let module = b.module(vec![add_int, add_float, caller]);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::General));
}

/// let x = if c { 1 } else { 2 } infers i32 for the if and for x.
#[test]
fn s3_if_as_expression() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let x = b.name("x");

    let c_parm = b.parm(c, builtins.bool);
    let sig = b.fn_sig(vec![c_parm], builtins.i32);

    let cond = b.name_use(c);
    let one = b.ulit(1, builtins.i32);
    let then_blk = b.block(vec![one]);
    let two = b.ulit(2, builtins.i32);
    let else_blk = b.block(vec![two]);
    let if_exp = b.if_else(cond, then_blk, else_blk);
    let x_dcl = b.let_dcl(x, PermKind::Imm, if_exp);

    let use_x = b.name_use(x);
    let ret = b.return_node(Some(use_x));
    let body = b.block(vec![x_dcl, ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    sess.analyze(module).expect("clean analysis");

    assert_eq!(sess.arena.vtype(if_exp), builtins.i32);
    assert_eq!(sess.arena.vtype(then_blk), builtins.i32);
    assert_eq!(sess.arena.vtype(else_blk), builtins.i32);
    assert_eq!(sess.arena.vtype(x_dcl), builtins.i32);
}

/// An if used for its value needs an else branch.
#[test]
fn if_as_value_without_else_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let x = b.name("x");

    let c_parm = b.parm(c, builtins.bool);
    let void = b.builtin_void();
    let sig = b.fn_sig(vec![c_parm], void);

    let cond = b.name_use(c);
    let one = b.ulit(1, builtins.i32);
    let then_blk = b.block(vec![one]);
    let if_exp = b.if_node(vec![(cond, then_blk)]);
    let x_dcl = b.var_dcl(x, PermKind::Imm, builtins.i32, Some(if_exp));

    let body = b.block(vec![x_dcl]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

/// The match-everything branch must come last.
#[test]
fn else_branch_before_a_condition_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let c_parm = b.parm(c, builtins.bool);
    let void = b.builtin_void();
    let sig = b.fn_sig(vec![c_parm], void);

    let else_blk = b.block(vec![]);
    let cond = b.name_use(c);
    let then_blk = b.block(vec![]);
    let if_stmt = b.if_node(vec![(void, else_blk), (cond, then_blk)]);

    let body = b.block(vec![if_stmt]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

struct PointParts {
    dcl: NodeId,
    x_default: NodeId,
}

/// struct Point { x i32 = 0, y i32 = 0 }
fn declare_point(sess: &mut Session) -> PointParts {
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let point = b.name("Point");
    let x = b.name("x");
    let y = b.name("y");
    let x_default = b.ulit(0, builtins.i32);
    let x_field = b.field_dcl(x, builtins.i32, Some(x_default));
    let y_default = b.ulit(0, builtins.i32);
    let y_field = b.field_dcl(y, builtins.i32, Some(y_default));
    let dcl = b.struct_dcl(point, vec![x_field, y_field], vec![], 0, vec![]);
    PointParts { dcl, x_default }
}

/// Point[y: 5] reorders to [0, y: 5].
#[test]
fn s4_struct_literal_reorder() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let point = declare_point(&mut sess);

    let mut b = sess.builder();
    let f = b.name("make");
    let point_name = b.name("Point");
    let rettype = b.name_use(point_name);
    let sig = b.fn_sig(vec![], rettype);

    let lit_type = b.name_use(point_name);
    let y = b.name("y");
    let five = b.ulit(5, builtins.i32);
    let named_y = b.named_val(y, five);
    let lit = b.type_lit(lit_type, vec![named_y]);
    let ret = b.return_node(Some(lit));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![point.dcl, f_dcl]);

    sess.analyze(module).expect("clean analysis");

    let args = match sess.arena.kind(lit) {
        NodeKind::TypeLit { args, .. } => args.clone(),
        _ => unreachable!(),
    };
    assert_eq!(args.len(), 2);
    // x filled from its default, y's named value swapped into place.
    assert_eq!(args[0], point.x_default);
    assert_eq!(args[1], named_y);
}

/// Reordering with an injected tag, a swap, and a default: the result is a
/// permutation of inputs, defaults, and the tag in field order.
#[test]
fn struct_literal_reorder_permutation() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let shape = b.name("Tagged");
    let tag = b.name("tag");
    let x = b.name("x");
    let y = b.name("y");
    let z = b.name("z");

    let tag_field = b.tag_field_dcl(tag, builtins.u32);
    let x_field = b.field_dcl(x, builtins.i32, None);
    let y_default = b.ulit(7, builtins.i32);
    let y_field = b.field_dcl(y, builtins.i32, Some(y_default));
    let z_default = b.ulit(9, builtins.i32);
    let z_field = b.field_dcl(z, builtins.i32, Some(z_default));
    let dcl = b.struct_dcl(
        shape,
        vec![tag_field, x_field, y_field, z_field],
        vec![],
        3,
        vec![],
    );

    let f = b.name("make");
    let rettype = b.name_use(shape);
    let sig = b.fn_sig(vec![], rettype);
    let lit_type = b.name_use(shape);
    let one = b.ulit(1, builtins.i32);
    let named_z = b.named_val(z, one);
    let five = b.ulit(5, builtins.i32);
    let named_x = b.named_val(x, five);
    // Fields arrive out of order: [z: 1, x: 5].
    let lit = b.type_lit(lit_type, vec![named_z, named_x]);
    let ret = b.return_node(Some(lit));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![dcl, f_dcl]);

    sess.analyze(module).expect("clean analysis");

    let args = match sess.arena.kind(lit) {
        NodeKind::TypeLit { args, .. } => args.clone(),
        _ => unreachable!(),
    };
    assert_eq!(args.len(), 4);
    // Injected discriminant first, in tag position.
    match sess.arena.kind(args[0]) {
        NodeKind::ULit { val } => assert_eq!(*val, 3),
        _ => panic!("expected the injected tag literal"),
    }
    assert_eq!(args[1], named_x);
    assert_eq!(args[2], y_default);
    assert_eq!(args[3], named_z);
}

/// Private fields may only be given a value from the type's own methods.
#[test]
fn private_field_outside_methods_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let vault = b.name("Vault");
    let secret = b.name("_secret");
    let default = b.ulit(0, builtins.i32);
    let field = b.field_dcl(secret, builtins.i32, Some(default));
    let dcl = b.struct_dcl(vault, vec![field], vec![], 0, vec![]);

    let f = b.name("crack");
    let rettype = b.name_use(vault);
    let sig = b.fn_sig(vec![], rettype);
    let lit_type = b.name_use(vault);
    let five = b.ulit(5, builtins.i32);
    let named = b.named_val(secret, five);
    let lit = b.type_lit(lit_type, vec![named]);
    let ret = b.return_node(Some(lit));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![dcl, f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::NotTyped));
}

#[test]
fn private_field_inside_methods_is_allowed() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let vault = b.name("Vault");
    let secret = b.name("_secret");
    let default = b.ulit(0, builtins.i32);
    let field = b.field_dcl(secret, builtins.i32, Some(default));

    let make = b.name("make");
    let rettype = b.name_use(vault);
    let sig = b.fn_sig(vec![], rettype);
    let lit_type = b.name_use(vault);
    let five = b.ulit(5, builtins.i32);
    let named = b.named_val(secret, five);
    let lit = b.type_lit(lit_type, vec![named]);
    let ret = b.return_node(Some(lit));
    let body = b.block(vec![ret]);
    let method = b.method_dcl(make, sig, Some(body));

    let dcl = b.struct_dcl(vault, vec![field], vec![method], 0, vec![]);
    let module = b.module(vec![dcl]);

    sess.analyze(module).expect("clean analysis");
}

/// Reinterpreting f32 as u32 is fine (same size); as u64 is not.
#[test]
fn s5_reinterpret_cast_size_check() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let sig = b.fn_sig(vec![], builtins.u32);
    let val = b.flit(1.0, builtins.f32);
    let cast = b.reinterpret_cast(val, builtins.u32);
    let ret = b.return_node(Some(cast));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);
    sess.analyze(module).expect("equal sizes reinterpret cleanly");

    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let g = b.name("g");
    let sig = b.fn_sig(vec![], builtins.u64);
    let val = b.flit(1.0, builtins.f32);
    let cast = b.reinterpret_cast(val, builtins.u64);
    let ret = b.return_node(Some(cast));
    let body = b.block(vec![ret]);
    let g_dcl = b.fn_dcl(g, sig, Some(body));
    let module = b.module(vec![g_dcl]);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

/// return if c { return 1 } else { 2 } rewrites the inner return away.
#[test]
fn s6_return_rewrite_strips_inner_returns() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let c_parm = b.parm(c, builtins.bool);
    let sig = b.fn_sig(vec![c_parm], builtins.i32);

    let cond = b.name_use(c);
    let one = b.ulit(1, builtins.i32);
    let inner_ret = b.return_node(Some(one));
    let then_blk = b.block(vec![inner_ret]);
    let two = b.ulit(2, builtins.i32);
    let else_blk = b.block(vec![two]);
    let if_exp = b.if_else(cond, then_blk, else_blk);
    let ret = b.return_node(Some(if_exp));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    sess.analyze(module).expect("clean analysis");

    // The inner return was replaced by its bare expression.
    match sess.arena.kind(then_blk) {
        NodeKind::Block { stmts } => assert_eq!(stmts.as_slice(), &[one]),
        _ => unreachable!(),
    }
    assert_eq!(sess.arena.vtype(if_exp), builtins.i32);
}

/// After a successful check, every value-bearing expression is typed.
#[test]
fn type_annotation_totality() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let x = b.name("x");
    let c_parm = b.parm(c, builtins.bool);
    let sig = b.fn_sig(vec![c_parm], builtins.i32);
    let cond = b.name_use(c);
    let one = b.ulit(1, builtins.i32);
    let then_blk = b.block(vec![one]);
    let two = b.ulit(2, builtins.i32);
    let else_blk = b.block(vec![two]);
    let if_exp = b.if_else(cond, then_blk, else_blk);
    let x_dcl = b.let_dcl(x, PermKind::Imm, if_exp);
    let use_x = b.name_use(x);
    let cast = b.cast(use_x, builtins.i64);
    let back = b.cast(cast, builtins.i32);
    let ret = b.return_node(Some(back));
    let body = b.block(vec![x_dcl, ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    sess.analyze(module).expect("clean analysis");

    let void = sess.arena.void();
    for id in sess.arena.ids() {
        let needs_type = matches!(
            sess.arena.kind(id),
            NodeKind::ULit { .. }
                | NodeKind::FLit { .. }
                | NodeKind::Cast { .. }
                | NodeKind::Is { .. }
                | NodeKind::Deref { .. }
                | NodeKind::TypeLit { .. }
                | NodeKind::Assign { .. }
        );
        if needs_type {
            assert_ne!(
                sess.arena.vtype(id),
                void,
                "expression {id} left without a type"
            );
        }
    }
}

/// Equal-cost candidates resolve to the earliest declaration, whatever the
/// declaration order is.
#[test]
fn overload_ties_pick_earliest_declaration() {
    for flipped in [false, true] {
        let mut sess = Session::new();
        let builtins = *sess.arena.builtins();

        let mut b = sess.builder();
        let pick = b.name("pick");
        let a = b.name("a");

        let p1 = b.parm(a, builtins.i32);
        let sig1 = b.fn_sig(vec![p1], builtins.i32);
        let first = b.fn_dcl(pick, sig1, None);
        let p2 = b.parm(a, builtins.i32);
        let sig2 = b.fn_sig(vec![p2], builtins.i32);
        let second = b.fn_dcl(pick, sig2, None);

        let small = b.ulit(1, builtins.i8);
        let (caller, callee) = {
            drop(b);
            call_add_in_fn(&mut sess, "c", builtins.i32, vec![small])
        };
        // call_add_in_fn calls "add"; rebind the callee to "pick".
        if let NodeKind::NameUse { name, .. } = &mut sess.arena.node_mut(callee).kind {
            *name = pick;
        }

        let mut b = sess.builder();
        let module = if flipped {
            b.module(vec![second, first, caller])
        } else {
            b.module(vec![first, second, caller])
        };
        sess.analyze(module).expect("clean analysis");

        let expected = if flipped { second } else { first };
        match sess.arena.kind(callee) {
            NodeKind::NameUse { dcl, .. } => assert_eq!(*dcl, Some(expected)),
            _ => unreachable!(),
        }
    }
}

/// u64[s] (number literal from an array ref) is rejected even though
/// cast(s, u64) is allowed.
#[test]
fn number_literal_stricter_than_cast() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("len");
    let s = b.name("s");
    let slice = b.array_ref_type(builtins.u8, PermKind::Imm);
    let parm = b.parm(s, slice);
    let sig = b.fn_sig(vec![parm], builtins.u64);
    let use_s = b.name_use(s);
    let cast = b.cast(use_s, builtins.u64);
    let ret = b.return_node(Some(cast));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);
    sess.analyze(module).expect("array ref casts to uint");

    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let g = b.name("len2");
    let s = b.name("s");
    let slice = b.array_ref_type(builtins.u8, PermKind::Imm);
    let parm = b.parm(s, slice);
    let sig = b.fn_sig(vec![parm], builtins.u64);
    let use_s = b.name_use(s);
    let lit = b.type_lit(builtins.u64, vec![use_s]);
    let ret = b.return_node(Some(lit));
    let body = b.block(vec![ret]);
    let g_dcl = b.fn_dcl(g, sig, Some(body));
    let module = b.module(vec![g_dcl]);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::BadArray));
}

fn tuple_return_module(sess: &mut Session, value_count: usize) -> NodeId {
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let f = b.name("pair");
    let rettype = b.ttuple(vec![builtins.i32, builtins.bool]);
    let sig = b.fn_sig(vec![], rettype);

    let mut values = Vec::new();
    if value_count >= 1 {
        values.push(b.ulit(1, builtins.i32));
    }
    if value_count >= 2 {
        values.push(b.ulit(1, builtins.bool));
    }
    if value_count >= 3 {
        values.push(b.ulit(2, builtins.i32));
    }
    let tuple = b.vtuple(values);
    let ret = b.return_node(Some(tuple));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    b.module(vec![f_dcl])
}

#[test]
fn tuple_return_requires_exact_arity() {
    let mut sess = Session::new();
    let module = tuple_return_module(&mut sess, 2);
    sess.analyze(module).expect("matching arity is clean");

    let mut sess = Session::new();
    let module = tuple_return_module(&mut sess, 1);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::BadTerm));

    let mut sess = Session::new();
    let module = tuple_return_module(&mut sess, 3);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::BadTerm));
}

/// A loop's value type is the least upper bound of its break values.
#[test]
fn loop_value_is_lub_of_breaks() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let c = b.name("c");
    let c_parm = b.parm(c, builtins.bool);
    let sig = b.fn_sig(vec![c_parm], builtins.i32);

    let cond = b.name_use(c);
    let small = b.ulit(1, builtins.i8);
    let brk_small = b.break_node(Some(small));
    let then_blk = b.block(vec![brk_small]);
    let wide = b.ulit(2, builtins.i32);
    let brk_wide = b.break_node(Some(wide));
    let else_blk = b.block(vec![brk_wide]);
    let if_stmt = b.if_else(cond, then_blk, else_blk);
    let loop_body = b.block(vec![if_stmt]);
    let loop_exp = b.loop_node(loop_body);
    let ret = b.return_node(Some(loop_exp));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    sess.analyze(module).expect("clean analysis");

    assert_eq!(sess.arena.vtype(loop_exp), builtins.i32);
    // The narrow break value was widened with an explicit cast.
    match sess.arena.kind(brk_small) {
        NodeKind::Break { exp: Some(exp) } => {
            assert!(matches!(sess.arena.kind(*exp), NodeKind::Cast { .. }));
        }
        _ => unreachable!(),
    }
}

#[test]
fn break_outside_loop_is_an_error() {
    let mut sess = Session::new();
    let mut b = sess.builder();
    let f = b.name("f");
    let void = b.builtin_void();
    let sig = b.fn_sig(vec![], void);
    let brk = b.break_node(None);
    let body = b.block(vec![brk]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::BadTerm));
}

#[test]
fn assignment_requires_a_mutable_target() {
    for (perm, ok) in [(PermKind::Imm, false), (PermKind::Mut, true)] {
        let mut sess = Session::new();
        let builtins = *sess.arena.builtins();

        let mut b = sess.builder();
        let f = b.name("f");
        let x = b.name("x");
        let void = b.builtin_void();
        let sig = b.fn_sig(vec![], void);
        let one = b.ulit(1, builtins.i32);
        let x_dcl = b.var_dcl(x, perm, builtins.i32, Some(one));
        let use_x = b.name_use(x);
        let two = b.ulit(2, builtins.i32);
        let assign = b.assign(use_x, two);
        let body = b.block(vec![x_dcl, assign]);
        let f_dcl = b.fn_dcl(f, sig, Some(body));
        let module = b.module(vec![f_dcl]);

        let result = sess.analyze(module);
        assert_eq!(result.is_ok(), ok);
        if !ok {
            assert!(error_kinds(&sess).contains(&DiagnosticKind::BadTerm));
        }
    }
}

/// *r reads through the reference; a bare r auto-derefs where the pointee
/// type is expected.
#[test]
fn deref_and_auto_deref() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let r = b.name("r");
    let ref_type = b.ref_type(builtins.i32, PermKind::Imm);
    let parm = b.parm(r, ref_type);
    let sig = b.fn_sig(vec![parm], builtins.i32);
    let use_r = b.name_use(r);
    let deref = b.deref(use_r);
    let ret = b.return_node(Some(deref));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);
    sess.analyze(module).expect("clean analysis");
    assert_eq!(sess.arena.vtype(deref), builtins.i32);

    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let g = b.name("g");
    let r = b.name("r");
    let ref_type = b.ref_type(builtins.i32, PermKind::Imm);
    let parm = b.parm(r, ref_type);
    let sig = b.fn_sig(vec![parm], builtins.i32);
    let use_r = b.name_use(r);
    let ret = b.return_node(Some(use_r));
    let body = b.block(vec![ret]);
    let g_dcl = b.fn_dcl(g, sig, Some(body));
    let module = b.module(vec![g_dcl]);
    sess.analyze(module).expect("clean analysis");

    match sess.arena.kind(ret) {
        NodeKind::Return { exp: Some(exp), .. } => {
            assert!(matches!(sess.arena.kind(*exp), NodeKind::Deref { .. }));
        }
        _ => unreachable!(),
    }
}

#[test]
fn deref_of_non_pointer_is_an_error() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let f = b.name("f");
    let sig = b.fn_sig(vec![], builtins.i32);
    let one = b.ulit(1, builtins.i32);
    let deref = b.deref(one);
    let ret = b.return_node(Some(deref));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::NotPointer));
}

/// Numeric casts within the compatible table compose both ways.
#[test]
fn numeric_casts_round_trip() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let x = b.name("x");
    let parm = b.parm(x, builtins.u32);
    let sig = b.fn_sig(vec![parm], builtins.u32);
    let use_x = b.name_use(x);
    let up = b.cast(use_x, builtins.i64);
    let down = b.cast(up, builtins.u32);
    let ret = b.return_node(Some(down));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);

    sess.analyze(module).expect("clean analysis");
    assert_eq!(sess.arena.vtype(up), builtins.i64);
    assert_eq!(sess.arena.vtype(down), builtins.u32);
}

struct ShapeWorld {
    trait_dcl: NodeId,
    circle: NodeId,
    square: NodeId,
}

/// trait Shape; struct Circle (tagged) implements Shape; struct Square
/// stands apart.
fn declare_shapes(sess: &mut Session) -> ShapeWorld {
    let builtins = *sess.arena.builtins();
    let mut b = sess.builder();
    let shape = b.name("Shape");
    let circle = b.name("Circle");
    let square = b.name("Square");
    let tag = b.name("tag");

    let trait_dcl = b.trait_dcl(shape, vec![], vec![]);
    let circle_tag = b.tag_field_dcl(tag, builtins.u32);
    let circle_dcl = b.struct_dcl(circle, vec![circle_tag], vec![], 1, vec![trait_dcl]);
    let square_tag = b.tag_field_dcl(tag, builtins.u32);
    let square_dcl = b.struct_dcl(square, vec![square_tag], vec![], 2, vec![]);

    ShapeWorld {
        trait_dcl,
        circle: circle_dcl,
        square: square_dcl,
    }
}

#[test]
fn is_specializes_virtual_references() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let shapes = {
        let mut b = sess.builder();
        let shape = b.name("Shape");
        let circle = b.name("Circle");
        let tag = b.name("tag");
        let trait_dcl = b.trait_dcl(shape, vec![], vec![]);
        let circle_tag = b.tag_field_dcl(tag, builtins.u32);
        let circle_dcl = b.struct_dcl(circle, vec![circle_tag], vec![], 1, vec![trait_dcl]);
        (trait_dcl, circle_dcl)
    };
    let (trait_dcl, circle_dcl) = shapes;

    let mut b = sess.builder();
    let f = b.name("f");
    let s = b.name("s");
    let shape_name = b.name("Shape");
    let circle_name = b.name("Circle");
    let shape_use = b.name_use(shape_name);
    let vref = b.virt_ref_type(shape_use, PermKind::Imm);
    let parm = b.parm(s, vref);
    let sig = b.fn_sig(vec![parm], builtins.bool);
    let use_s = b.name_use(s);
    let circle_use = b.name_use(circle_name);
    let circle_ref = b.ref_type(circle_use, PermKind::Imm);
    let test = b.is_test(use_s, circle_ref);
    let ret = b.return_node(Some(test));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![trait_dcl, circle_dcl, f_dcl]);

    sess.analyze(module).expect("clean analysis");
    assert_eq!(sess.arena.vtype(test), builtins.bool);
}

#[test]
fn is_rejects_unrelated_specialization() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let shapes = declare_shapes(&mut sess);

    let mut b = sess.builder();
    let f = b.name("f");
    let s = b.name("s");
    let shape_name = b.name("Shape");
    let shape_use = b.name_use(shape_name);
    let vref = b.virt_ref_type(shape_use, PermKind::Imm);
    let parm = b.parm(s, vref);
    let sig = b.fn_sig(vec![parm], builtins.bool);
    let use_s = b.name_use(s);
    let square_name = b.name("Square");
    let square_use = b.name_use(square_name);
    let square_ref = b.ref_type(square_use, PermKind::Imm);
    let test = b.is_test(use_s, square_ref);
    let ret = b.return_node(Some(test));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![shapes.trait_dcl, shapes.circle, shapes.square, f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

/// A struct without a tag field has no runtime mechanism for `is`.
#[test]
fn is_requires_a_tag_mechanism() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let plain = b.name("Plain");
    let dcl = b.struct_dcl(plain, vec![], vec![], 0, vec![]);

    let f = b.name("f");
    let v = b.name("v");
    let plain_use = b.name_use(plain);
    let parm = b.parm(v, plain_use);
    let sig = b.fn_sig(vec![parm], builtins.bool);
    let use_v = b.name_use(v);
    let plain_use2 = b.name_use(plain);
    let test = b.is_test(use_v, plain_use2);
    let ret = b.return_node(Some(test));
    let body = b.block(vec![ret]);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![dcl, f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

/// obj.method(args) resolves through the receiver type's namespace and
/// auto-refs the receiver when self wants a reference.
#[test]
fn method_call_with_auto_ref() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let counter = b.name("Counter");
    let n = b.name("n");
    let bump = b.name("bump");
    let self_name = b.name("self");
    let by = b.name("by");

    let n_default = b.ulit(0, builtins.i32);
    let n_field = b.field_dcl(n, builtins.i32, Some(n_default));

    let counter_use = b.name_use(counter);
    let self_type = b.ref_type(counter_use, PermKind::Mut);
    let self_parm = b.parm(self_name, self_type);
    let by_parm = b.parm(by, builtins.i32);
    let sig = b.fn_sig(vec![self_parm, by_parm], builtins.i32);
    let method = b.method_dcl(bump, sig, None);

    let counter_dcl = b.struct_dcl(counter, vec![n_field], vec![method], 0, vec![]);

    let f = b.name("f");
    let f_sig = b.fn_sig(vec![], builtins.i32);
    let c = b.name("c");
    let counter_use2 = b.name_use(counter);
    let lit = b.type_lit(counter_use2, vec![]);
    let c_dcl = b.let_dcl(c, PermKind::Mut, lit);
    let use_c = b.name_use(c);
    let two = b.ulit(2, builtins.i32);
    let call = b.method_call(use_c, bump, vec![two]);
    let ret = b.return_node(Some(call));
    let body = b.block(vec![c_dcl, ret]);
    let f_dcl = b.fn_dcl(f, f_sig, Some(body));
    let module = b.module(vec![counter_dcl, f_dcl]);

    sess.analyze(module).expect("clean analysis");

    // The call was rewritten into resolved plain-call form with the
    // auto-refed receiver first.
    match sess.arena.kind(call) {
        NodeKind::FnCall {
            callee,
            method: None,
            args,
        } => {
            match sess.arena.kind(*callee) {
                NodeKind::NameUse { dcl, .. } => assert_eq!(*dcl, Some(method)),
                _ => panic!("callee must be a resolved name"),
            }
            assert_eq!(args.len(), 2);
            assert!(matches!(sess.arena.kind(args[0]), NodeKind::Cast { .. }));
        }
        _ => panic!("method call was not rewritten"),
    }
    assert_eq!(sess.arena.vtype(call), builtins.i32);
}

/// An immutable receiver cannot auto-ref into a mut self parameter.
#[test]
fn method_auto_ref_respects_permissions() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let counter = b.name("Counter");
    let bump = b.name("bump");
    let self_name = b.name("self");

    let counter_use = b.name_use(counter);
    let self_type = b.ref_type(counter_use, PermKind::Mut);
    let self_parm = b.parm(self_name, self_type);
    let sig = b.fn_sig(vec![self_parm], builtins.i32);
    let method = b.method_dcl(bump, sig, None);
    let counter_dcl = b.struct_dcl(counter, vec![], vec![method], 0, vec![]);

    let f = b.name("f");
    let f_sig = b.fn_sig(vec![], builtins.i32);
    let c = b.name("c");
    let counter_use2 = b.name_use(counter);
    let lit = b.type_lit(counter_use2, vec![]);
    let c_dcl = b.let_dcl(c, PermKind::Imm, lit);
    let use_c = b.name_use(c);
    let call = b.method_call(use_c, bump, vec![]);
    let ret = b.return_node(Some(call));
    let body = b.block(vec![c_dcl, ret]);
    let f_dcl = b.fn_dcl(f, f_sig, Some(body));
    let module = b.module(vec![counter_dcl, f_dcl]);

    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::General));
}

/// Only numbers and references may convert to bool.
#[test]
fn cast_to_bool_rules() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("f");
    let one = b.ulit(1, builtins.i32);
    let cast = b.cast(one, builtins.bool);
    let ret = b.return_node(Some(cast));
    let body = b.block(vec![ret]);
    let sig = b.fn_sig(vec![], builtins.bool);
    let f_dcl = b.fn_dcl(f, sig, Some(body));
    let module = b.module(vec![f_dcl]);
    sess.analyze(module).expect("numbers convert to bool");

    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();
    let point = declare_point(&mut sess);

    let mut b = sess.builder();
    let g = b.name("g");
    let p = b.name("p");
    let point_use = b.use_of("Point");
    let parm = b.parm(p, point_use);
    let sig = b.fn_sig(vec![parm], builtins.bool);
    let use_p = b.name_use(p);
    let cast = b.cast(use_p, builtins.bool);
    let ret = b.return_node(Some(cast));
    let body = b.block(vec![ret]);
    let g_dcl = b.fn_dcl(g, sig, Some(body));
    let module = b.module(vec![point.dcl, g_dcl]);
    assert!(sess.analyze(module).is_err());
    assert!(error_kinds(&sess).contains(&DiagnosticKind::InvalidType));
}

#[test]
fn literal_detection_looks_through_named_values() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let y = b.name("y");
    let point_use = b.use_of("Point");
    let five = b.ulit(5, builtins.i32);
    let named = b.named_val(y, five);
    let literal = b.type_lit(point_use, vec![named]);

    let point_use2 = b.use_of("Point");
    let x_use = b.use_of("x");
    let non_literal = b.type_lit(point_use2, vec![x_use]);

    assert!(super::type_lit_is_literal(&sess.arena, literal));
    assert!(!super::type_lit_is_literal(&sess.arena, non_literal));
}

/// Missing trailing arguments fill from parameter defaults.
#[test]
fn call_fills_parameter_defaults() {
    let mut sess = Session::new();
    let builtins = *sess.arena.builtins();

    let mut b = sess.builder();
    let f = b.name("scale");
    let x = b.name("x");
    let factor = b.name("factor");
    let x_parm = b.parm(x, builtins.i32);
    let ten = b.ulit(10, builtins.i32);
    let factor_parm = b.parm_default(factor, builtins.i32, ten);
    let sig = b.fn_sig(vec![x_parm, factor_parm], builtins.i32);
    let f_dcl = b.fn_dcl(f, sig, None);

    let g = b.name("g");
    let g_sig = b.fn_sig(vec![], builtins.i32);
    let use_f = b.name_use(f);
    let one = b.ulit(1, builtins.i32);
    let call = b.fn_call(use_f, vec![one]);
    let ret = b.return_node(Some(call));
    let body = b.block(vec![ret]);
    let g_dcl = b.fn_dcl(g, g_sig, Some(body));
    let module = b.module(vec![f_dcl, g_dcl]);

    sess.analyze(module).expect("clean analysis");

    match sess.arena.kind(call) {
        NodeKind::FnCall { args, .. } => {
            assert_eq!(args.len(), 2);
            assert_eq!(args[1], ten);
        }
        _ => unreachable!(),
    }
}
