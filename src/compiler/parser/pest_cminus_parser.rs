use pest::iterators::Pair;
use pest::Parser;
use simple_error::SimpleError;

use super::AstParser;
use super::super::ast::{
    DeclKind, ExpKind, ExpType, NodeAttr, Operator, ParamKind, StmtKind, TreeNode,
};

/// CMinusParser parses a string into a series of tokens.
/// These tokens are defined as a Context-Free-Grammar in the src/cminus.pest
/// file. The tokens generated from this parser are then formalised into the
/// tree node representation shared by the analyser and the code generator.
#[derive(pest_derive::Parser)]
#[grammar = "cminus.pest"]
struct CMinusParser;

/// PestCMinusParser is a concrete AstParser.
/// It uses the pest library to generate a token sequence from a source
/// string that is then converted into the syntax tree.
pub struct PestCMinusParser;

/// Source line of the first token of a pair.
fn line(pair: &Pair<Rule>) -> i32 {
    pair.as_span().start_pos().line_col().0 as i32
}

/// Links a list of nodes into a sibling chain headed by the first.
fn link_siblings(nodes: Vec<TreeNode>) -> Option<Box<TreeNode>> {
    let mut head = None;
    for mut node in nodes.into_iter().rev() {
        node.sibling = head;
        head = Some(Box::new(node));
    }
    head
}

impl PestCMinusParser {
    /// Parses source string into the top level declaration chain.
    fn parse_into_node_tree(&self, source: &str) -> Result<TreeNode, SimpleError> {
        let pairs = CMinusParser::parse(Rule::program, source)
            .map_err(|error| SimpleError::new(error.to_string()))?;

        for pair in pairs {
            if pair.as_rule() == Rule::program {
                let declarations: Vec<TreeNode> = pair
                    .into_inner()
                    .filter(|p| p.as_rule() != Rule::EOI)
                    .map(|p| self.parse_pair_declaration(p))
                    .collect();
                return link_siblings(declarations)
                    .map(|head| *head)
                    .ok_or_else(|| SimpleError::new("program is empty"));
            }
        }
        Err(SimpleError::new("program is empty"))
    }

    fn parse_pair_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        match pair.as_rule() {
            Rule::var_declaration => self.parse_pair_var_declaration(pair),
            Rule::arr_declaration => self.parse_pair_arr_declaration(pair),
            Rule::fun_declaration => self.parse_pair_fun_declaration(pair),
            _ => panic!("Whoops! Unprocessed declaration rule: {:?}", pair.as_rule()),
        }
    }

    fn parse_pair_var_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let type_node = self.parse_pair_type_specifier(pair.next().unwrap());
        let identifier = pair.next().unwrap();

        let mut node = TreeNode::decl(DeclKind::VAR_DECL, lineno);
        node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
        node.children[0] = Some(Box::new(type_node));
        node
    }

    fn parse_pair_arr_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let type_node = self.parse_pair_type_specifier(pair.next().unwrap());
        let identifier = pair.next().unwrap();
        let length = self.parse_pair_number(pair.next().unwrap());

        let mut node = TreeNode::decl(DeclKind::ARR_DECL, lineno);
        node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
        node.children[0] = Some(Box::new(type_node));
        node.children[1] = Some(Box::new(length));
        node
    }

    fn parse_pair_fun_declaration(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let type_node = self.parse_pair_type_specifier(pair.next().unwrap());
        let identifier = pair.next().unwrap();
        let params = self.parse_pair_params(pair.next().unwrap());
        let body = self.parse_pair_compound(pair.next().unwrap());

        let mut node = TreeNode::decl(DeclKind::FUN_DECL, lineno);
        node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
        node.children[0] = Some(Box::new(type_node));
        node.children[1] = params;
        node.children[2] = Some(Box::new(body));
        node
    }

    fn parse_pair_type_specifier(&self, pair: Pair<Rule>) -> TreeNode {
        let exp_type = ExpType::parse(pair.as_str())
            .unwrap_or_else(|| panic!("Whoops! Unprocessed type specifier: {}", pair.as_str()));
        TreeNode::type_node(exp_type, line(&pair))
    }

    /// Parses a parameter list into a sibling chain. An empty `(void)`
    /// list becomes a single VOID_PARAM node.
    fn parse_pair_params(&self, pair: Pair<Rule>) -> Option<Box<TreeNode>> {
        let lineno = line(&pair);
        let inner = pair.into_inner().next().unwrap();
        match inner.as_rule() {
            Rule::void_params => {
                Some(Box::new(TreeNode::param(ParamKind::VOID_PARAM, lineno)))
            }
            Rule::param_list => {
                let params: Vec<TreeNode> = inner
                    .into_inner()
                    .map(|p| self.parse_pair_param(p))
                    .collect();
                link_siblings(params)
            }
            _ => panic!("Whoops! Unprocessed params rule: {:?}", inner.as_rule()),
        }
    }

    fn parse_pair_param(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let kind = match pair.as_rule() {
            Rule::var_param => ParamKind::VAR_PARAM,
            Rule::arr_param => ParamKind::ARR_PARAM,
            _ => panic!("Whoops! Unprocessed param rule: {:?}", pair.as_rule()),
        };
        let mut pair = pair.into_inner();
        let type_node = self.parse_pair_type_specifier(pair.next().unwrap());
        let identifier = pair.next().unwrap();

        let mut node = TreeNode::param(kind, lineno);
        node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
        node.children[0] = Some(Box::new(type_node));
        node
    }

    fn parse_pair_compound(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let declarations: Vec<TreeNode> = pair
            .next()
            .unwrap()
            .into_inner()
            .map(|p| self.parse_pair_declaration(p))
            .collect();
        let statements: Vec<TreeNode> = pair
            .next()
            .unwrap()
            .into_inner()
            .filter_map(|p| self.parse_pair_statement(p))
            .collect();

        let mut node = TreeNode::stmt(StmtKind::COMPOUND, lineno);
        node.children[0] = link_siblings(declarations);
        node.children[1] = link_siblings(statements);
        node
    }

    /// Parses a statement. An empty expression statement (a bare `;`)
    /// produces no node at all.
    fn parse_pair_statement(&self, pair: Pair<Rule>) -> Option<TreeNode> {
        match pair.as_rule() {
            Rule::compound_stmt => Some(self.parse_pair_compound(pair)),
            Rule::selection_stmt => Some(self.parse_pair_selection(pair)),
            Rule::iteration_stmt => Some(self.parse_pair_iteration(pair)),
            Rule::return_stmt => Some(self.parse_pair_return(pair)),
            Rule::expression_stmt => {
                let expression = pair.into_inner().next()?;
                Some(self.parse_pair_expression(expression))
            }
            _ => panic!("Whoops! Unprocessed statement rule: {:?}", pair.as_rule()),
        }
    }

    fn parse_pair_selection(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let condition = self.parse_pair_expression(pair.next().unwrap());
        let then_branch = self.parse_pair_statement(pair.next().unwrap());
        let else_branch = pair.next().and_then(|p| self.parse_pair_statement(p));

        let mut node = TreeNode::stmt(StmtKind::SELECTION, lineno);
        node.children[0] = Some(Box::new(condition));
        node.children[1] = then_branch.map(Box::new);
        node.children[2] = else_branch.map(Box::new);
        node
    }

    fn parse_pair_iteration(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let condition = self.parse_pair_expression(pair.next().unwrap());
        let body = self.parse_pair_statement(pair.next().unwrap());

        let mut node = TreeNode::stmt(StmtKind::ITERATION, lineno);
        node.children[0] = Some(Box::new(condition));
        node.children[1] = body.map(Box::new);
        node
    }

    fn parse_pair_return(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut node = TreeNode::stmt(StmtKind::RETURN, lineno);
        if let Some(expression) = pair.into_inner().next() {
            node.children[0] = Some(Box::new(self.parse_pair_expression(expression)));
        }
        node
    }

    fn parse_pair_expression(&self, pair: Pair<Rule>) -> TreeNode {
        match pair.as_rule() {
            Rule::expression => {
                self.parse_pair_expression(pair.into_inner().next().unwrap())
            }
            Rule::assign_expression => self.parse_pair_assignment(pair),
            Rule::simple_expression => self.parse_pair_simple_expression(pair),
            _ => panic!("Whoops! Unprocessed expression rule: {:?}", pair.as_rule()),
        }
    }

    fn parse_pair_assignment(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let target = self.parse_pair_var(pair.next().unwrap());
        let expression = self.parse_pair_expression(pair.next().unwrap());

        let mut node = TreeNode::exp(ExpKind::ASSIGN, lineno);
        node.children[0] = Some(Box::new(target));
        node.children[1] = Some(Box::new(expression));
        node
    }

    /// Parses a simple expression. C-Minus allows at most one relational
    /// operator here so no folding is required.
    fn parse_pair_simple_expression(&self, pair: Pair<Rule>) -> TreeNode {
        let mut pair = pair.into_inner();
        let lhs = self.parse_pair_additive(pair.next().unwrap());
        match pair.next() {
            Some(op_pair) => {
                let rhs = self.parse_pair_additive(pair.next().unwrap());
                let mut node = TreeNode::exp(ExpKind::OP, line(&op_pair));
                node.attr = NodeAttr::OP(self.parse_pair_operator(&op_pair));
                node.children[0] = Some(Box::new(lhs));
                node.children[1] = Some(Box::new(rhs));
                node
            }
            None => lhs,
        }
    }

    /// Parses an additive or multiplicative chain. The linear list of
    /// operations of equal precedence is folded into a left leaning tree
    /// of OP nodes.
    fn parse_pair_binary_chain(
        &self,
        pair: Pair<Rule>,
        parse_operand: impl Fn(&Self, Pair<Rule>) -> TreeNode,
    ) -> TreeNode {
        let mut pair = pair.into_inner();
        let mut lhs = parse_operand(self, pair.next().unwrap());
        while pair.peek().is_some() {
            let op_pair = pair.next().unwrap();
            let rhs = parse_operand(self, pair.next().unwrap());
            let mut node = TreeNode::exp(ExpKind::OP, line(&op_pair));
            node.attr = NodeAttr::OP(self.parse_pair_operator(&op_pair));
            node.children[0] = Some(Box::new(lhs));
            node.children[1] = Some(Box::new(rhs));
            lhs = node;
        }
        lhs
    }

    fn parse_pair_additive(&self, pair: Pair<Rule>) -> TreeNode {
        self.parse_pair_binary_chain(pair, Self::parse_pair_term)
    }

    fn parse_pair_term(&self, pair: Pair<Rule>) -> TreeNode {
        self.parse_pair_binary_chain(pair, Self::parse_pair_factor)
    }

    fn parse_pair_factor(&self, pair: Pair<Rule>) -> TreeNode {
        match pair.as_rule() {
            Rule::number => self.parse_pair_number(pair),
            Rule::var => self.parse_pair_var(pair),
            Rule::call => self.parse_pair_call(pair),
            Rule::expression => self.parse_pair_expression(pair),
            _ => panic!("Whoops! Unprocessed factor rule: {:?}", pair.as_rule()),
        }
    }

    fn parse_pair_number(&self, pair: Pair<Rule>) -> TreeNode {
        let mut node = TreeNode::exp(ExpKind::CONST, line(&pair));
        node.attr = NodeAttr::VALUE(pair.as_str().parse().unwrap());
        node
    }

    /// Parses a variable reference. A subscripted reference becomes an ARR
    /// node with the index expression as its first child.
    fn parse_pair_var(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let identifier = pair.next().unwrap();

        match pair.next() {
            Some(index) => {
                let mut node = TreeNode::exp(ExpKind::ARR, lineno);
                node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
                node.children[0] = Some(Box::new(self.parse_pair_expression(index)));
                node
            }
            None => {
                let mut node = TreeNode::exp(ExpKind::VAR, lineno);
                node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
                node
            }
        }
    }

    fn parse_pair_call(&self, pair: Pair<Rule>) -> TreeNode {
        let lineno = line(&pair);
        let mut pair = pair.into_inner();
        let identifier = pair.next().unwrap();
        let arguments: Vec<TreeNode> = match pair.next().unwrap().into_inner().next() {
            Some(arg_list) => arg_list
                .into_inner()
                .map(|p| self.parse_pair_expression(p))
                .collect(),
            None => Vec::new(),
        };

        let mut node = TreeNode::exp(ExpKind::CALL, lineno);
        node.attr = NodeAttr::NAME(String::from(identifier.as_str()));
        node.children[0] = link_siblings(arguments);
        node
    }

    fn parse_pair_operator(&self, pair: &Pair<Rule>) -> Operator {
        match pair.as_rule() {
            Rule::plus => Operator::PLUS,
            Rule::minus => Operator::MINUS,
            Rule::times => Operator::TIMES,
            Rule::over => Operator::OVER,
            Rule::less_than => Operator::LESS_THAN,
            Rule::less_equal => Operator::LESS_EQUAL,
            Rule::greater_than => Operator::GREATER_THAN,
            Rule::greater_equal => Operator::GREATER_EQUAL,
            Rule::equal => Operator::EQUAL,
            Rule::not_equal => Operator::NOT_EQUAL,
            _ => panic!("Whoops! Unprocessed operator rule: {:?}", pair.as_rule()),
        }
    }
}

/// AstParser Trait Concrete Implementation
impl AstParser for PestCMinusParser {
    /// PestCMinusParser has no configuration the
    /// default is just instantiation
    fn default() -> Self {
        Self
    }

    fn parse(self, source: &str) -> Result<TreeNode, SimpleError> {
        self.parse_into_node_tree(source)
    }
}
