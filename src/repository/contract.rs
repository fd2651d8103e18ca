use alloy::sol;

// Contract ABI definitions for the test exchange stack
sol! {
    /// Faucet-style ERC20 used as a test token.
    ///
    /// Anyone may mint ("drip") balances without payment. The constructor
    /// takes the token symbol as its only argument.
    #[sol(rpc)]
    interface IFaucetToken {
        /// Mints `amount` tokens to `account`.
        ///
        /// # Arguments
        /// * `account` - The recipient of the minted tokens
        /// * `amount` - The amount in the token's smallest unit
        function drip(address account, uint256 amount) external;

        /// Allows `spender` to withdraw up to `amount` from the caller.
        ///
        /// # Returns
        /// Whether the approval succeeded
        function approve(address spender, uint256 amount) external returns (bool);

        /// Returns the token name.
        function name() external view returns (string memory);

        /// Returns the token symbol.
        function symbol() external view returns (string memory);

        /// Returns the number of decimals used by the token.
        function decimals() external view returns (uint8);
    }

    /// Uniswap V2 Factory interface for pair creation.
    #[sol(rpc)]
    interface IUniswapV2Factory {
        /// Emitted once per created pair.
        ///
        /// The pair address is the third positional argument; the last
        /// argument is the number of pairs created so far.
        event PairCreated(address indexed token0, address indexed token1, address pair, uint256 pairCount);

        /// Creates the pair for two tokens. Reverts if the pair already exists.
        ///
        /// # Arguments
        /// * `tokenA` - The address of the first token
        /// * `tokenB` - The address of the second token
        ///
        /// # Returns
        /// The address of the new pair contract
        function createPair(address tokenA, address tokenB) external returns (address pair);
    }

    /// Uniswap V2 Router02 interface for liquidity provisioning and quotes.
    #[sol(rpc)]
    interface IUniswapV2Router02 {
        /// Adds liquidity to the pool for `tokenA`/`tokenB`, creating it if needed.
        ///
        /// # Arguments
        /// * `tokenA` - The first token of the pool
        /// * `tokenB` - The second token of the pool
        /// * `amountADesired` - The amount of tokenA to add if the price allows
        /// * `amountBDesired` - The amount of tokenB to add if the price allows
        /// * `amountAMin` - Lower bound for tokenA actually deposited
        /// * `amountBMin` - Lower bound for tokenB actually deposited
        /// * `to` - Recipient of the liquidity tokens
        /// * `deadline` - Unix timestamp after which the transaction will revert
        ///
        /// # Returns
        /// Amounts deposited and liquidity minted
        function addLiquidity(
            address tokenA,
            address tokenB,
            uint256 amountADesired,
            uint256 amountBDesired,
            uint256 amountAMin,
            uint256 amountBMin,
            address to,
            uint256 deadline
        ) external returns (uint256 amountA, uint256 amountB, uint256 liquidity);

        /// Given an input amount and token path, returns the output amount at each hop.
        ///
        /// # Returns
        /// Array of amounts where the last element is the output amount
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
    }
}
