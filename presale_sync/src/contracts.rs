use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IPresale {
        function presaleStart() external view returns (uint256);
        function presaleEnd() external view returns (uint256);
        function currentPhase() external view returns (uint256);
        function phases(uint256 index) external view returns (uint256 priceUSD, uint256 allocation, uint256 sold);
        function getLatestBNBPrice() external view returns (uint256);
        function purchased(address buyer) external view returns (uint256);
        function usdt() external view returns (address);

        function buyWithBNB() external payable;
        function buyWithUSDT(uint256 amount) external;
        function claimTokens() external;
    }

    #[sol(rpc)]
    interface IERC20 {
        function decimals() external view returns (uint8);
        function balanceOf(address owner) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
